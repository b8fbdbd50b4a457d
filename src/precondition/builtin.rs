use serenity::async_trait;

use super::{Invocation, InvocationKind, Outcome, Precondition};
use crate::{constant, context::Context};

/// Only users listed in `framework.owner_ids` pass.
#[derive(Default)]
pub struct OwnerOnlyPrecondition;

#[async_trait]
impl Precondition for OwnerOnlyPrecondition {
    fn supports(&self, _: InvocationKind) -> bool {
        true
    }

    async fn check(&self, ctx: &Context, invocation: Invocation<'_>) -> anyhow::Result<Outcome> {
        if ctx.config.owner_ids.contains(&invocation.user_id()) {
            Ok(Outcome::ok())
        } else {
            Ok(Outcome::error(constant::message::NOT_OWNER))
        }
    }
}

/// The invoking message must reply to another message.
#[derive(Default)]
pub struct MustBeReplyPrecondition;

#[async_trait]
impl Precondition for MustBeReplyPrecondition {
    fn supports(&self, kind: InvocationKind) -> bool {
        kind == InvocationKind::Message
    }

    async fn check(&self, _: &Context, invocation: Invocation<'_>) -> anyhow::Result<Outcome> {
        match invocation {
            Invocation::Message(message) if !message.is_reply() => {
                Ok(Outcome::error(constant::message::NOT_A_REPLY))
            }
            _ => Ok(Outcome::ok()),
        }
    }
}
