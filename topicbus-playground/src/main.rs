use anyhow::anyhow;
use tracing::{info, Level};

use topicbus_core::event::topic_bus::TopicBus;
use topicbus_core::ext::init_logger;

#[derive(Debug)]
struct Mail {
    sender: String,
    subject: String,
}

fn main() -> anyhow::Result<()> {
    init_logger(Level::DEBUG);
    let bus = TopicBus::<Mail>::new();
    let inbox = bus.subscribe("inbox/new", |topic: &str, mail: &Mail| {
        info!("[{}] {} from {}", topic, mail.subject, mail.sender);
        Ok(())
    })?;
    bus.subscribe("inbox/new", |_: &str, mail: &Mail| {
        if mail.sender.is_empty() {
            return Err(anyhow!("mail without a sender"));
        }
        info!("sender {} looks fine", mail.sender);
        Ok(())
    })?;
    info!("topics with subscribers: {:?}", bus.topics());

    bus.publish(
        "inbox/new",
        &Mail {
            sender: "x".to_string(),
            subject: "hello".to_string(),
        },
    );
    // the anonymous check rejects this one, the inbox listener still runs
    bus.publish(
        "inbox/new",
        &Mail {
            sender: String::new(),
            subject: "spam".to_string(),
        },
    );

    bus.unsubscribe(inbox);
    bus.publish(
        "inbox/new",
        &Mail {
            sender: "y".to_string(),
            subject: "goodbye".to_string(),
        },
    );
    info!("{} subscriptions left", bus.len());
    Ok(())
}
