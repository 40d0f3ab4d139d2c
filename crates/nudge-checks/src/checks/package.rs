use async_trait::async_trait;
use tracing::debug;

use nudge_core::{Argument, Requirement, Version};

use crate::context::CheckContext;
use crate::error::Result;
use crate::registry::{Check, CheckOutcome};

/// `package_release(name, *constraints)`: met when the registry lists a
/// version that satisfies every constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageReleaseCheck;

#[async_trait]
impl Check for PackageReleaseCheck {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        let name = super::string_arg("package_release", args, 0)?;
        let requirement = Requirement::parse(&super::string_args("package_release", args, 1)?)?;

        let Some(published) = ctx.packages.versions(name).await? else {
            return Ok(CheckOutcome::Inconclusive(format!(
                "The gem *{name}* doesn't seem to exist, I can't determine if your TODO is ready to be addressed."
            )));
        };

        let released = published.iter().find(|number| match Version::parse(number) {
            Ok(version) => requirement.is_satisfied_by(&version),
            Err(e) => {
                debug!(package = %name, error = %e, "ignoring unparsable published version");
                false
            }
        });

        Ok(match released {
            Some(number) => CheckOutcome::Met(format!(
                "The gem *{name}* was released to version *{number}* and your TODO is now ready to be addressed."
            )),
            None => CheckOutcome::Unmet,
        })
    }
}

/// `package_bump(name, *constraints)`: met when the locked version of
/// `name` satisfies every constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageBumpCheck;

#[async_trait]
impl Check for PackageBumpCheck {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        let name = super::string_arg("package_bump", args, 0)?;
        let requirement = Requirement::parse(&super::string_args("package_bump", args, 1)?)?;

        let locked = ctx.lockfile.as_ref().and_then(|lock| lock.version_of(name));
        let Some(version) = locked else {
            return Ok(CheckOutcome::Inconclusive(format!(
                "The gem *{name}* is not in your dependencies, I can't determine if your TODO is ready to be addressed."
            )));
        };

        Ok(if requirement.is_satisfied_by(version) {
            CheckOutcome::Met(format!(
                "The gem *{name}* was updated to version *{version}* and your TODO is now ready to be addressed."
            ))
        } else {
            CheckOutcome::Unmet
        })
    }
}
