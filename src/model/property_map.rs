//! PropertyMap: the open extension map on entities, relations and offerings.

use std::collections::HashMap;
use super::Value;

/// A map of attribute names to values.
pub type PropertyMap = HashMap<String, Value>;
