/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Engine configuration.
//!
//! Every field has a default, so a JSON document only needs the keys it changes:
//!
//! ```
//! use i8080_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "entry_point": 256, "max_steps": 1000 }"#).unwrap();
//! assert_eq!(config.entry_point, 0x100);
//! assert_eq!(config.initial_sp, 0);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Address of the first instruction executed.
    pub entry_point: u16,
    /// Stack pointer at start.
    pub initial_sp: u16,
    /// Number of instructions after which `start` gives up. `None` runs until halt or stop.
    pub max_steps: Option<u64>,
    /// Emit a `trace` event for every executed instruction.
    pub trace_instructions: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            entry_point: 0x0000,
            initial_sp: 0x0000,
            max_steps: None,
            trace_instructions: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<EngineConfig> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
        let content = fs::read_to_string(path)?;
        EngineConfig::from_json_str(&content)
    }
}
