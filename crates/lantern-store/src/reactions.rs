use lantern_types::models::{Message, ReactionKind};

use crate::{ChannelStore, StoreError};

impl ChannelStore {
    /// Toggle `userid`'s membership in one reaction category of a message,
    /// looked up by `messageId` or `clientId`.
    ///
    /// Returns the updated record for broadcast, or `None` when no record
    /// matches (silent no-op). Toggling the same pair twice restores the
    /// original membership state.
    pub async fn toggle_reaction(
        &self,
        channel_id: &str,
        id_or_client_id: &str,
        userid: &str,
        category: ReactionKind,
    ) -> Result<Option<Message>, StoreError> {
        self.modify(channel_id, |log| {
            let index = Self::find_index(log, id_or_client_id)?;
            let message = &mut log[index];

            let set = message.reactions.set_mut(category);
            if let Some(pos) = set.iter().position(|u| u == userid) {
                set.remove(pos);
            } else {
                set.push(userid.to_string());
            }

            Some(message.clone())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_types::api::Submission;
    use lantern_types::models::MessageContent;
    use uuid::Uuid;

    async fn store_with_message() -> (ChannelStore, Message) {
        let dir = std::env::temp_dir().join(format!("lantern_reactions_test_{}", Uuid::new_v4()));
        let store = ChannelStore::open(dir).unwrap();
        let (channel_id, message) = crate::policy::normalize(Submission {
            channel_id: Some("c1".into()),
            userid: Some("u1".into()),
            content: Some(MessageContent::Text("hi".into())),
            ..Submission::default()
        })
        .unwrap();
        let message = store.append(&channel_id, message).await.unwrap();
        (store, message)
    }

    #[tokio::test]
    async fn toggle_is_an_involution() {
        let (store, msg) = store_with_message().await;
        let id = msg.message_id.to_string();

        let on = store
            .toggle_reaction("c1", &id, "u2", ReactionKind::Like)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(on.reactions.like, vec!["u2".to_string()]);

        let off = store
            .toggle_reaction("c1", &id, "u2", ReactionKind::Like)
            .await
            .unwrap()
            .unwrap();
        assert!(off.reactions.like.is_empty());

        // Final state is persisted, not just returned.
        let log = store.read_all("c1").await;
        assert!(log[0].reactions.like.is_empty());
    }

    #[tokio::test]
    async fn categories_and_users_are_independent() {
        let (store, msg) = store_with_message().await;
        let id = msg.message_id.to_string();

        store
            .toggle_reaction("c1", &id, "u2", ReactionKind::Like)
            .await
            .unwrap();
        store
            .toggle_reaction("c1", &id, "u3", ReactionKind::Like)
            .await
            .unwrap();
        let updated = store
            .toggle_reaction("c1", &id, "u2", ReactionKind::Done)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.reactions.like, vec!["u2".to_string(), "u3".to_string()]);
        assert_eq!(updated.reactions.done, vec!["u2".to_string()]);
        assert!(updated.reactions.disagree.is_empty());
    }

    #[tokio::test]
    async fn unknown_message_is_silent_noop() {
        let (store, _) = store_with_message().await;
        let result = store
            .toggle_reaction("c1", "no-such-id", "u2", ReactionKind::Like)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn client_id_resolves_the_same_record() {
        let dir = std::env::temp_dir().join(format!("lantern_reactions_test_{}", Uuid::new_v4()));
        let store = ChannelStore::open(dir).unwrap();
        let (channel_id, message) = crate::policy::normalize(Submission {
            channel_id: Some("c1".into()),
            userid: Some("u1".into()),
            content: Some(MessageContent::Text("hi".into())),
            client_id: Some("tmp-42".into()),
            ..Submission::default()
        })
        .unwrap();
        store.append(&channel_id, message).await.unwrap();

        let updated = store
            .toggle_reaction("c1", "tmp-42", "u2", ReactionKind::Disagree)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.reactions.disagree, vec!["u2".to_string()]);
    }
}
