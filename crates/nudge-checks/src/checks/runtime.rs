use async_trait::async_trait;
use tracing::warn;

use nudge_core::{Argument, Requirement};

use crate::context::CheckContext;
use crate::error::Result;
use crate::registry::{Check, CheckOutcome};

/// `runtime_version(*constraints)`: met when the host runtime version
/// satisfies every constraint. Unmet when no version can be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeVersionCheck;

#[async_trait]
impl Check for RuntimeVersionCheck {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        let requirement = Requirement::parse(&super::string_args("runtime_version", args, 0)?)?;
        let Some(current) = ctx.runtime_version().await else {
            warn!("runtime version unavailable; treating runtime_version as unmet");
            return Ok(CheckOutcome::Unmet);
        };

        Ok(if requirement.is_satisfied_by(current) {
            CheckOutcome::Met(format!(
                "The currently installed version of Ruby {current} is {requirement}."
            ))
        } else {
            CheckOutcome::Unmet
        })
    }
}
