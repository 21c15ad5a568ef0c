//! # Dialogue Boundary
//!
//! The opaque text-in/text-out service the Dialogue gesture consults.
//!
//! `Ok(None)`, an empty reply, an `Err` and an elapsed timeout all mean
//! the same thing to the core: no response.
//!
//! ## Implementations
//!
//! | Oracle | Description |
//! |--------|-------------|
//! | `SilentOracle` | Never answers |
//! | `ScriptedOracle` | Replays canned replies in order, then falls silent |
//! | `ReflectiveOracle` | Deterministic offline reply keyed on the intent |

pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::model::Offering;

pub use scripted::{ReflectiveOracle, ScriptedOracle, SilentOracle};

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Answer an offering, or decline with `Ok(None)`.
    async fn invoke(&self, offering: &Offering) -> Result<Option<String>>;

    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<O: Oracle + ?Sized> Oracle for Arc<O> {
    async fn invoke(&self, offering: &Offering) -> Result<Option<String>> {
        (**self).invoke(offering).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<O: Oracle + ?Sized> Oracle for Box<O> {
    async fn invoke(&self, offering: &Offering) -> Result<Option<String>> {
        (**self).invoke(offering).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
