use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use commandeer::commands::{
    ArgValue, BoundArgs, Channel, ChannelMessageEvent, ChatTransport, CommandDescriptor,
    CommandExecutor, ExecutionContext, HandlerOutput, IdentityLookup, InboundEvent, Listener,
    Permission, PrivateMessageEvent, SlotKind, User,
};
use commandeer::{DispatchConfig, Dispatcher};

/// Prints replies to stdout
struct ConsoleTransport;

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_channel_message(&self, channel: &Channel, text: &str) -> Result<()> {
        println!("[#{}] bot: {text}", channel.name);
        Ok(())
    }

    async fn send_private_message(&self, user: &User, text: &str) -> Result<()> {
        println!("[@{}] bot: {text}", user.name);
        Ok(())
    }
}

/// Every user seen on the console so far
#[derive(Clone, Default)]
struct ConsoleDirectory {
    users: Arc<DashMap<String, User>>,
}

impl ConsoleDirectory {
    fn user(&self, name: &str) -> User {
        let name = name.to_lowercase();
        self.users
            .entry(name.clone())
            .or_insert_with(|| User::new(name.clone(), name))
            .clone()
    }
}

#[async_trait]
impl IdentityLookup for ConsoleDirectory {
    async fn user_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self.users.get(name).map(|user| user.clone()))
    }
}

struct EchoCommand;

#[async_trait]
impl CommandExecutor for EchoCommand {
    fn parameters(&self) -> Vec<SlotKind> {
        vec![SlotKind::Arguments]
    }

    async fn execute(&self, args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        Ok(HandlerOutput::text(args.list(0).join(" ")))
    }
}

struct PingCommand;

#[async_trait]
impl CommandExecutor for PingCommand {
    async fn execute(&self, _args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        Ok(HandlerOutput::text("pong"))
    }
}

struct WhoAmICommand;

#[async_trait]
impl CommandExecutor for WhoAmICommand {
    fn parameters(&self) -> Vec<SlotKind> {
        vec![SlotKind::Invoker, SlotKind::Channel]
    }

    async fn execute(&self, args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        let name = args.user(0).map(User::label).unwrap_or("unknown");
        let reply = match args.channel(1) {
            Some(channel) => format!("You are {name}, talking in #{}", channel.name),
            None => format!("You are {name}, talking in private"),
        };
        Ok(HandlerOutput::text(reply))
    }
}

struct HugCommand;

#[async_trait]
impl CommandExecutor for HugCommand {
    fn parameters(&self) -> Vec<SlotKind> {
        vec![SlotKind::Invoker, SlotKind::MixedArguments]
    }

    async fn execute(&self, args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        let from = args.user(0).map(User::label).unwrap_or("someone");
        let targets: Vec<&str> = args
            .mixed(1)
            .iter()
            .filter_map(|arg| match arg {
                ArgValue::User(user) => Some(user.label()),
                ArgValue::Text(_) => None,
            })
            .collect();

        if targets.is_empty() {
            return Ok(HandlerOutput::text(format!("{from} hugs the air")));
        }
        Ok(HandlerOutput::text(format!("{from} hugs {}", targets.join(" and "))))
    }
}

struct SecretCommand;

#[async_trait]
impl CommandExecutor for SecretCommand {
    async fn execute(&self, _args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        Ok(HandlerOutput::text("The cake is in the fridge."))
    }
}

/// Replies after a delay; registered as a detached command
struct SlowCommand;

#[async_trait]
impl CommandExecutor for SlowCommand {
    fn parameters(&self) -> Vec<SlotKind> {
        vec![SlotKind::Tokenized]
    }

    async fn execute(&self, _args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(HandlerOutput::text("...done thinking"))
    }
}

/// Lists commands with whatever prefix is current when asked
struct HelpCommand {
    dispatcher: Dispatcher,
}

#[async_trait]
impl CommandExecutor for HelpCommand {
    async fn execute(&self, _args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        Ok(HandlerOutput::text(self.dispatcher.help_text().await))
    }
}

/// Changes the command prefix; owner only
struct PrefixCommand {
    dispatcher: Dispatcher,
}

#[async_trait]
impl CommandExecutor for PrefixCommand {
    fn parameters(&self) -> Vec<SlotKind> {
        vec![SlotKind::Arguments]
    }

    async fn execute(&self, args: BoundArgs, _ctx: &ExecutionContext) -> Result<HandlerOutput> {
        let Some(prefix) = args.list(0).first() else {
            let current = self.dispatcher.prefix().await;
            return Ok(HandlerOutput::text(format!("Prefix is '{current}'")));
        };
        self.dispatcher.set_prefix(Some(prefix.as_str())).await;
        let current = self.dispatcher.prefix().await;
        Ok(HandlerOutput::text(format!("Prefix is now '{current}'")))
    }
}

async fn register_commands(dispatcher: &Dispatcher) -> Result<()> {
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(EchoCommand))
                .aliases(["echo", "say"])
                .usage("echo <text>")
                .description("Repeats what you say")
                .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(PingCommand))
                .alias("ping")
                .description("Checks that the bot is alive")
                .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(WhoAmICommand))
                .alias("whoami")
                .description("Shows who and where you are")
                .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(HugCommand))
                .alias("hug")
                .usage("hug @user")
                .description("Hugs someone")
                .channel_messages(true)
                .private_messages(false)
                .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(SecretCommand))
                .alias("secret")
                .description("Moderators only")
                .required_permission(Permission::Moderator)
                .show_in_help(false)
                .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(SlowCommand))
                .aliases(["slow", "think"])
                .description("Takes its time, without holding up other commands")
                .run_async(true)
                .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(HelpCommand {
                dispatcher: dispatcher.clone(),
            }))
            .aliases(["help", "commands"])
            .description("Lists commands")
            .build(),
        )
        .await?;
    dispatcher
        .register(
            CommandDescriptor::builder(Arc::new(PrefixCommand {
                dispatcher: dispatcher.clone(),
            }))
            .alias("prefix")
            .usage("prefix <new prefix>")
            .description("Changes the command prefix")
            .required_permission(Permission::Owner)
            .build(),
        )
        .await?;
    Ok(())
}

/// `#channel user: text` is a channel message, `@user: text` a private one
fn parse_line(directory: &ConsoleDirectory, line: &str) -> Option<InboundEvent> {
    if let Some(rest) = line.strip_prefix('#') {
        let (channel, rest) = rest.split_once(' ')?;
        let (user, text) = rest.split_once(": ")?;
        return Some(
            ChannelMessageEvent::new(
                Channel::new(channel, channel),
                directory.user(user.trim()),
                text,
            )
            .into(),
        );
    }
    if let Some(rest) = line.strip_prefix('@') {
        let (user, text) = rest.split_once(": ")?;
        return Some(PrivateMessageEvent::new(directory.user(user.trim()), text).into());
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = DispatchConfig::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting console command bot...");

    let directory = ConsoleDirectory::default();
    let dispatcher = Dispatcher::new(
        &config,
        Arc::new(ConsoleTransport),
        Arc::new(directory.clone()),
    )?;
    register_commands(&dispatcher).await?;

    if let Ok(owner) = std::env::var("BOT_OWNER") {
        let owner = directory.user(&owner);
        dispatcher.permissions().grant(&owner, Permission::Owner);
        dispatcher.permissions().grant(&owner, Permission::Moderator);
        info!("🔑 Granted owner permissions to {}", owner.name);
    }

    let (tx, rx) = Listener::channel();
    let listener = Listener::start(dispatcher.clone(), rx);

    info!(
        "Ready. Prefix is '{}'. Type '#channel user: text' or '@user: text'.",
        dispatcher.prefix().await
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(event) = parse_line(&directory, line) else {
            warn!("Could not parse line: {line}");
            continue;
        };
        if let Err(e) = tx.send(event).await {
            error!("Listener is gone: {e}");
            break;
        }
    }

    drop(tx);
    let dispatched = listener.join().await;
    dispatcher.executor().wait_idle().await;
    info!("Shutting down after {dispatched} message(s)");

    Ok(())
}
