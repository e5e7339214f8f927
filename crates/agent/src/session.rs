use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orderly_core::{AmbiguityPrompt, DraftOrder, Field, FinalizedOrder, IssueSet};

/// Where the conversation currently stands. Terminal outcomes (confirmed,
/// aborted) are not states; the session resets when they are reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ConversationState {
    /// Gathering fields. `last_asked` remembers which fields the previous
    /// turn requested so the next extraction can be filtered to them.
    Collecting { last_asked: Option<Vec<Field>> },
    /// Waiting for the user to pick one of the listed options.
    AmbiguityPending { prompt: AmbiguityPrompt },
    /// Waiting for a yes/no (or an edit) on the frozen order.
    ConfirmationPending { payload: FinalizedOrder },
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::Collecting { last_asked: None }
    }
}

/// All per-conversation state. Fully serializable so the host can persist it
/// between turns; the engine holds no conversation state of its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub state: ConversationState,
    pub draft: DraftOrder,
    pub issues: IssueSet,
    pub last_utterance: String,
    pub last_question: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ConversationState::default(),
            draft: DraftOrder::default(),
            issues: IssueSet::default(),
            last_utterance: String::new(),
            last_question: None,
        }
    }

    /// Clears everything except the conversation id, ready for a new order.
    pub fn reset(&mut self) {
        self.state = ConversationState::default();
        self.draft = DraftOrder::default();
        self.issues = IssueSet::default();
        self.last_utterance.clear();
        self.last_question = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_through_json() {
        let mut session = Session::new();
        session.draft.set(Field::City, Some("Sorriso".to_string()));
        session.last_question = Some("Which plant?".to_string());

        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, session.id);
        assert_eq!(back.draft, session.draft);
        assert_eq!(back.last_question.as_deref(), Some("Which plant?"));
    }

    #[test]
    fn reset_keeps_the_id() {
        let mut session = Session::new();
        let id = session.id;
        session.draft.set(Field::Plant, Some("LRV".to_string()));
        session.reset();
        assert_eq!(session.id, id);
        assert_eq!(session.draft, DraftOrder::default());
        assert!(matches!(session.state, ConversationState::Collecting { last_asked: None }));
    }
}
