use async_trait::async_trait;

use nudge_core::Argument;

use crate::config::GITHUB_TOKEN_ENV;
use crate::context::CheckContext;
use crate::error::Result;
use crate::issue_tracker::IssueKind;
use crate::registry::{Check, CheckOutcome};

fn unreachable_message(kind: IssueKind, org: &str, repo: &str, number: &str) -> String {
    format!(
        "I can't retrieve the information from the {kind} *{number}* in the *{org}/{repo}* repository.\n\
         \n\
         If the repository is a private one, make sure to export the `{GITHUB_TOKEN_ENV}`\n\
         environment variable with a correct GitHub token.\n"
    )
}

fn web_url(kind: IssueKind, org: &str, repo: &str, number: &str) -> String {
    format!("https://github.com/{org}/{repo}/{}/{number}", kind.web_path())
}

/// `issue_close` / `pull_request_close`: met once the issue is closed.
#[derive(Debug, Clone, Copy)]
pub struct IssueCloseCheck {
    kind: IssueKind,
}

impl IssueCloseCheck {
    pub fn new(kind: IssueKind) -> Self {
        Self { kind }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            IssueKind::Issue => "issue_close",
            IssueKind::PullRequest => "pull_request_close",
        }
    }
}

#[async_trait]
impl Check for IssueCloseCheck {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        let org = super::string_arg(self.name(), args, 0)?;
        let repo = super::string_arg(self.name(), args, 1)?;
        let number = super::number_arg(self.name(), args, 2)?;

        let Some(issue) = ctx.issues.fetch(self.kind, org, repo, &number).await? else {
            return Ok(CheckOutcome::Inconclusive(unreachable_message(
                self.kind, org, repo, &number,
            )));
        };

        if !issue.is_closed() {
            return Ok(CheckOutcome::Unmet);
        }

        let what = match self.kind {
            IssueKind::Issue => "issue",
            IssueKind::PullRequest => "pull request",
        };
        Ok(CheckOutcome::Met(format!(
            "The {what} {} is now closed, your TODO is ready to be addressed.",
            web_url(self.kind, org, repo, &number)
        )))
    }
}

/// How a reference check phrases its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStyle {
    /// `issue_pin(...)` in an `on:` clause.
    Pin,
    /// `context: "org/repo#n"`.
    Context,
}

/// `issue_pin` / `issue_context`: describe an issue without waiting on it.
///
/// An unreachable issue yields the explanation for pins and
/// [`CheckOutcome::Unmet`] for context, which drops the context line.
#[derive(Debug, Clone, Copy)]
pub struct IssueReferenceCheck {
    style: ReferenceStyle,
}

impl IssueReferenceCheck {
    pub fn new(style: ReferenceStyle) -> Self {
        Self { style }
    }

    fn name(&self) -> &'static str {
        match self.style {
            ReferenceStyle::Pin => "issue_pin",
            ReferenceStyle::Context => "issue_context",
        }
    }
}

#[async_trait]
impl Check for IssueReferenceCheck {
    async fn evaluate(&self, ctx: &CheckContext, args: &[Argument]) -> Result<CheckOutcome> {
        let org = super::string_arg(self.name(), args, 0)?;
        let repo = super::string_arg(self.name(), args, 1)?;
        let number = super::number_arg(self.name(), args, 2)?;
        let kind = IssueKind::Issue;

        let Some(issue) = ctx.issues.fetch(kind, org, repo, &number).await? else {
            return Ok(match self.style {
                ReferenceStyle::Pin => {
                    CheckOutcome::Inconclusive(unreachable_message(kind, org, repo, &number))
                }
                ReferenceStyle::Context => CheckOutcome::Unmet,
            });
        };

        let prefix = match self.style {
            ReferenceStyle::Pin => format!("📌 Pinned to issue #{number}:"),
            ReferenceStyle::Context => format!("📌 Context: Issue #{number} -"),
        };
        Ok(CheckOutcome::Met(format!(
            "{prefix} \"{}\" [{}] ({}) - {}",
            issue.title,
            issue.state,
            issue.assignee_label(),
            web_url(kind, org, repo, &number)
        )))
    }
}
