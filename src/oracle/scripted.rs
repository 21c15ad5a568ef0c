//! Built-in oracles for tests, demos and offline runs.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Oracle;
use crate::model::Offering;
use crate::{Error, Result};

/// Never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentOracle;

#[async_trait]
impl Oracle for SilentOracle {
    async fn invoke(&self, _offering: &Offering) -> Result<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// One scripted turn.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Silence,
    /// Fails the call with this message.
    Fail(String),
    /// Sleeps before answering; lets tests exercise the dialogue timeout.
    Delayed(Duration, String),
}

/// Replays canned replies in FIFO order, then stays silent.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    queue: Mutex<VecDeque<Reply>>,
    offerings: Mutex<Vec<Offering>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle that answers each string once, in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new();
        for r in replies {
            oracle.push(Reply::Text(r.into()));
        }
        oracle
    }

    pub fn push(&self, reply: Reply) {
        self.queue.lock().push_back(reply);
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }

    /// Every offering received so far.
    pub fn offerings(&self) -> Vec<Offering> {
        self.offerings.lock().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn invoke(&self, offering: &Offering) -> Result<Option<String>> {
        self.offerings.lock().push(offering.clone());
        // guard dropped before any await
        let next = self.queue.lock().pop_front();
        match next {
            None | Some(Reply::Silence) => Ok(None),
            Some(Reply::Text(text)) => Ok(Some(text)),
            Some(Reply::Fail(message)) => Err(Error::Oracle(message)),
            Some(Reply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(Some(text))
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Deterministic offline stand-in for a real dialogue partner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectiveOracle;

#[async_trait]
impl Oracle for ReflectiveOracle {
    async fn invoke(&self, offering: &Offering) -> Result<Option<String>> {
        let intent = offering.intent.to_lowercase();
        let reply = if intent.contains("connection") || intent.contains("meaning") {
            "Between entities a third is born, a field of reciprocity. \
             Meaning lives not in things but in the interval between them. \
             Perhaps explore intervality as a new ontological category."
                .to_string()
        } else if intent.contains("boundary") || intent.contains("limit") {
            "A boundary is not a wall but a membrane through which exchange passes. \
             Recognising a limit is the condition of transformation. \
             Maybe introduce an entity called threshold_of_knowing."
                .to_string()
        } else {
            format!(
                "Answer to the inquiry: {}. \
                 It must be admitted: I do not know, but I can offer a hypothesis. \
                 Explore ontological_hypothesis as a provisional construction.",
                offering.intent
            )
        };
        Ok(Some(reply))
    }

    fn name(&self) -> &str {
        "reflective"
    }
}
