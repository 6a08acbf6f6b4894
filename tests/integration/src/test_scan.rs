//! Scan and parallel scan end to end.

#[cfg(test)]
mod tests {
    use dynomap_model::types::{ReturnConsumedCapacity, Select};
    use dynomap_model::{DynamoDBOperation, Item};
    use futures::TryStreamExt;

    use crate::{MemoryGateway, users_table};

    fn seed(memory: &MemoryGateway, count: i64) {
        for i in 0..count {
            let mut item = Item::new();
            item.insert("email".to_owned(), format!("user{i:02}@example.com").into());
            item.insert("name".to_owned(), format!("User {i}").into());
            item.insert("age".to_owned(), (20 + i).into());
            memory.seed(item).unwrap();
        }
    }

    #[tokio::test]
    async fn test_should_filter_across_pages() {
        let (table, memory) = users_table();
        seed(&memory, 25);

        let result = table
            .scan()
            .where_("age")
            .gte(30_i64)
            .where_("age")
            .lt(40_i64)
            .limit(4)
            .load_all()
            .exec()
            .await
            .unwrap();
        assert_eq!(result.count, 10);
        assert_eq!(result.scanned_count, Some(25));
        assert_eq!(memory.calls(DynamoDBOperation::Scan), 7);
    }

    #[tokio::test]
    async fn test_should_count_without_items() {
        let (table, memory) = users_table();
        seed(&memory, 12);

        let result = table
            .scan()
            .select(Select::Count)
            .load_all()
            .exec()
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.count, 12);
    }

    #[tokio::test]
    async fn test_should_sum_consumed_capacity() {
        let (table, memory) = users_table();
        seed(&memory, 25);

        let result = table
            .scan()
            .limit(10)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .load_all()
            .exec()
            .await
            .unwrap();
        let capacity = result.consumed_capacity.unwrap();
        assert_eq!(capacity.capacity_units, Some(3.0));
        assert_eq!(capacity.table_name.as_deref(), Some("users"));
    }

    #[tokio::test]
    async fn test_should_omit_capacity_when_not_requested() {
        let (table, memory) = users_table();
        seed(&memory, 3);

        let result = table.scan().exec().await.unwrap();
        assert!(result.consumed_capacity.is_none());
        assert_eq!(result.items.len(), 3);
    }

    #[tokio::test]
    async fn test_should_read_every_segment_of_parallel_scan() {
        let (table, memory) = users_table();
        seed(&memory, 25);

        let result = table
            .parallel_scan(4)
            .limit(3)
            .load_all()
            .exec()
            .await
            .unwrap();
        assert_eq!(result.count, 25);
        assert_eq!(result.items.len(), 25);
        assert!(result.last_evaluated_key.is_none());

        let mut emails: Vec<String> = result
            .items
            .iter()
            .filter_map(|r| r.get("email").and_then(|v| v.as_s()).map(ToOwned::to_owned))
            .collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 25);
    }

    #[tokio::test]
    async fn test_should_stream_parallel_scan_pages() {
        let (table, memory) = users_table();
        seed(&memory, 25);

        let pages: Vec<_> = table
            .parallel_scan(3)
            .attributes(["email"])
            .limit(5)
            .load_all()
            .exec_stream()
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let total: i64 = pages.iter().map(|p| p.count).sum();
        assert_eq!(total, 25);
        assert!(pages.iter().flat_map(|p| &p.items).all(|item| item.len() == 1));
        assert_eq!(pages.len(), 6);
    }
}
