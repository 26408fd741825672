use dog_offload::prelude::*;
use dog_offload::ReceiptHandle;

const BUCKET: &str = "bound-queue-payloads";

fn create_queue(config: OffloadConfig) -> (ExtendedQueue, MemoryObjectStore, MemoryQueueService) {
    let store = MemoryObjectStore::new();
    store.create_bucket(BUCKET);
    let service = MemoryQueueService::new();
    let url = service.create_queue("bound");
    let client = ExtendedClient::new(service.clone(), OffloadEngine::new(store.clone(), config));
    (client.queue(url), store, service)
}

/// B1. Messages received from a bound queue delete themselves and their payload
#[tokio::test]
async fn test_received_message_deletes_itself() {
    let (queue, store, service) = create_queue(OffloadConfig::new(BUCKET));
    let body = "y".repeat(300_000);

    queue.send_message(queue.message(body.clone())).await.unwrap();
    assert_eq!(store.object_count(BUCKET), 1);

    let messages = queue.receive_messages(ReceiveMessageRequest::default()).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body(), Some(body.as_str()));
    assert!(ReceiptHandle::is_encoded(messages[0].receipt_handle().unwrap()));

    messages[0].delete().await.unwrap();
    assert_eq!(store.object_count(BUCKET), 0);
    assert_eq!(service.message_count(queue.url()), 0);
}

/// B2. One engine serves concurrent senders
#[tokio::test]
async fn test_concurrent_senders_share_the_engine() {
    let (queue, store, service) = create_queue(OffloadConfig::new(BUCKET).always_through_s3());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue.send_message(queue.message(format!("message {}", i))).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.object_count(BUCKET), 8);
    assert_eq!(service.message_count(queue.url()), 8);

    let messages = queue
        .receive_messages(ReceiveMessageRequest::default().with_max_number_of_messages(10))
        .await
        .unwrap();
    let mut bodies: Vec<_> = messages.iter().filter_map(|m| m.body()).collect();
    bodies.sort_unstable();
    assert_eq!(bodies.len(), 8);
    assert_eq!(bodies[0], "message 0");
}

/// B3. Mixed batch send through the bound queue
#[tokio::test]
async fn test_bound_batch_send_and_delete() {
    let (queue, store, service) = create_queue(OffloadConfig::new(BUCKET).with_threshold(10));

    let output = queue
        .send_messages(vec![
            SendMessageBatchRequestEntry::new("0", "short"),
            SendMessageBatchRequestEntry::new("1", "definitely longer than ten")
                .with_attribute("Author", MessageAttributeValue::string("alice")),
        ])
        .await
        .unwrap();
    assert_eq!(output.successful.len(), 2);
    assert_eq!(store.put_count(), 1);

    let messages = queue
        .receive_messages(
            ReceiveMessageRequest::default()
                .with_max_number_of_messages(10)
                .with_message_attribute_names(["Author"]),
        )
        .await
        .unwrap();
    let entries = messages
        .iter()
        .enumerate()
        .map(|(i, m)| m.delete_entry(i.to_string()))
        .collect();

    let deleted = queue.delete_messages(entries).await.unwrap();
    assert_eq!(deleted.successful.len(), 2);
    assert_eq!(store.object_count(BUCKET), 0);
    assert_eq!(service.message_count(queue.url()), 0);
}
