// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Formatter factory for resolving protocols from configuration

use super::nowdawn::NowDawnFormatter;
use super::scenic::ScenicFormatter;
use super::Formatter;
use crate::error::ConfigError;
use std::sync::Arc;

pub struct FormatterFactory;

impl FormatterFactory {
    /// Protocol names accepted by [`FormatterFactory::create`]
    pub const SUPPORTED: [&'static str; 2] = ["nowdawn", "scenic"];

    /// Create the formatter for a configured protocol name
    pub fn create(protocol: &str) -> Result<Arc<dyn Formatter>, ConfigError> {
        match protocol.to_ascii_lowercase().as_str() {
            "nowdawn" => Ok(Arc::new(NowDawnFormatter)),
            "scenic" => Ok(Arc::new(ScenicFormatter)),
            _ => Err(ConfigError::UnknownProtocol(protocol.to_string())),
        }
    }
}
