use cordwork::{Context, Event, Export, Handler, HandlerOptions, constant};
use serenity::async_trait;

#[derive(Default)]
pub struct GreetingHandler;

#[async_trait]
impl Handler for GreetingHandler {
    fn options(&self) -> HandlerOptions {
        HandlerOptions::new().event(constant::event::READY).once()
    }

    async fn run(&self, ctx: &Context, event: &Event) -> anyhow::Result<()> {
        if let Event::Ready(ready) = event {
            tracing::info!(
                "{} can run {} command(s); try `{}ping`",
                ready.user_tag,
                ctx.commands.len(),
                constant::MESSAGE_PREFIX
            );
        }

        Ok(())
    }
}

pub fn export() -> Export<dyn Handler> {
    cordwork::export!(dyn Handler => GreetingHandler)
}
