use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::command::OpCode;
use super::error::{CalcrpcError, Result};

/// The operation servers that make up a deployment.
///
/// The registry registers roles in the order of [`ServerRole::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    Arithmetic,
    NumberTheory,
    News,
}

impl ServerRole {
    pub const ALL: [ServerRole; 3] = [
        ServerRole::Arithmetic,
        ServerRole::NumberTheory,
        ServerRole::News,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ServerRole::Arithmetic => "arithmetic",
            ServerRole::NumberTheory => "number_theory",
            ServerRole::News => "news",
        }
    }

    pub fn operations(&self) -> &'static [OpCode] {
        match self {
            ServerRole::Arithmetic => &[OpCode::Sum, OpCode::Sub, OpCode::Prod, OpCode::Div],
            ServerRole::NumberTheory => &[OpCode::Fat, OpCode::Prim],
            ServerRole::News => &[OpCode::News],
        }
    }

    pub fn serves(&self, op: OpCode) -> bool {
        self.operations().contains(&op)
    }

    /// File name of this role's server-side cache.
    pub fn cache_file_name(&self) -> String {
        format!("{}_cache.json", self.name())
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServerRole {
    type Err = CalcrpcError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_");
        ServerRole::ALL
            .into_iter()
            .find(|role| role.name() == normalized)
            .ok_or_else(|| CalcrpcError::Config(format!("Unknown server role '{}'", s)))
    }
}
