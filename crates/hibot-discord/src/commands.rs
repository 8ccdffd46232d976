//! Slash command definitions and dispatch.

use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use serenity::client::Context;
use serenity::model::application::{
    CommandDataOption, CommandDataOptionValue, CommandInteraction, CommandOptionType,
};
use serenity::model::Permissions;

use hibot_core::{
    domain::UserId,
    highlights::commands as highlights,
    info,
    messaging::types::Reply,
    peps,
    Result,
};

use crate::gateway::AppState;
use crate::messenger::build_embed;

pub fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("highlights")
            .description("Manage your highlight words.")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "create",
                    "Create a highlight.",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "word",
                        "The word to be notified about.",
                    )
                    .required(true),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "delete",
                    "Delete a highlight.",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "word",
                        "The highlight to delete.",
                    )
                    .required(true),
                ),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "list",
                "List all of your highlights.",
            )),
        CreateCommand::new("pep")
            .description("Find a Python Enhancement Proposal.")
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, "number", "The PEP number.")
                    .min_int_value(0)
                    .max_int_value(9999)
                    .required(true),
            ),
        CreateCommand::new("stats").description("Exact values for server statistics."),
        CreateCommand::new("links").description("Useful links."),
        CreateCommand::new("ping").description("Pong!"),
        CreateCommand::new("set-donor-status")
            .description("Sets the donor status for a user.")
            .default_member_permissions(Permissions::MANAGE_ROLES)
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::User,
                    "member",
                    "The member to set the donor status for.",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Boolean,
                    "is-donor",
                    "Whether or not this user is a donor.",
                )
                .required(true),
            ),
    ]
}

pub async fn dispatch(state: &AppState, ctx: &Context, cmd: CommandInteraction) {
    let reply = run_command(state, ctx, &cmd).await;
    if let Err(err) = respond(ctx, &cmd, reply).await {
        tracing::warn!("failed to respond to /{}: {err}", cmd.data.name);
    }
}

async fn run_command(state: &AppState, ctx: &Context, cmd: &CommandInteraction) -> Reply {
    let invoker = UserId(cmd.user.id.get());
    let options = &cmd.data.options;

    let result: Result<Reply> = match cmd.data.name.as_str() {
        "highlights" => highlights_command(state, invoker, options).await,
        "pep" => match int_option(options, "number").and_then(|n| u32::try_from(n).ok()) {
            Some(number) => Ok(peps::pep_command(&state.registry, number, state.cfg.theme).await),
            None => Ok(bad_invocation()),
        },
        "stats" => Ok(state.stats.stats_reply().await),
        "links" => Ok(info::links_reply(&state.cfg)),
        "ping" => Ok(info::ping_reply(shard_latency(state, ctx).await)),
        "set-donor-status" => {
            match (user_option(options, "member"), bool_option(options, "is-donor")) {
                (Some(member), Some(is_donor)) => {
                    state.donors.set_donor_status(member, is_donor).await
                }
                _ => Ok(bad_invocation()),
            }
        }
        other => {
            tracing::warn!("unhandled command /{other}");
            Ok(bad_invocation())
        }
    };

    match result {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!("/{} failed: {err}", cmd.data.name);
            Reply::ephemeral_text("Something went wrong.")
        }
    }
}

async fn highlights_command(
    state: &AppState,
    invoker: UserId,
    options: &[CommandDataOption],
) -> Result<Reply> {
    let Some((name, sub)) = subcommand(options) else {
        return Ok(bad_invocation());
    };
    match (name, str_option(sub, "word")) {
        ("create", Some(word)) => highlights::create(&state.pipeline, invoker, word).await,
        ("delete", Some(word)) => highlights::delete(&state.pipeline, invoker, word).await,
        ("list", _) => highlights::list(&state.pipeline, invoker).await,
        _ => Ok(bad_invocation()),
    }
}

fn bad_invocation() -> Reply {
    Reply::ephemeral_text("Something went wrong.")
}

/// Heartbeat latency of the shard this interaction arrived on, once the
/// first heartbeat ack has been seen.
async fn shard_latency(state: &AppState, ctx: &Context) -> Option<std::time::Duration> {
    let runners = state.shard_manager.runners.lock().await;
    runners.get(&ctx.shard_id).and_then(|runner| runner.latency)
}

async fn respond(ctx: &Context, cmd: &CommandInteraction, reply: Reply) -> serenity::Result<()> {
    let mut message = CreateInteractionResponseMessage::new();
    if let Some(content) = reply.content {
        message = message.content(content);
    }
    if let Some(embed) = reply.embed {
        message = message.embed(build_embed(embed));
    }
    if reply.ephemeral {
        message = message.ephemeral(true);
    }
    cmd.create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
}

fn subcommand(options: &[CommandDataOption]) -> Option<(&str, &[CommandDataOption])> {
    options.iter().find_map(|opt| match &opt.value {
        CommandDataOptionValue::SubCommand(sub) => Some((opt.name.as_str(), sub.as_slice())),
        _ => None,
    })
}

fn str_option<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a str> {
    options.iter().find_map(|opt| match &opt.value {
        CommandDataOptionValue::String(value) if opt.name == name => Some(value.as_str()),
        _ => None,
    })
}

fn int_option(options: &[CommandDataOption], name: &str) -> Option<i64> {
    options.iter().find_map(|opt| match opt.value {
        CommandDataOptionValue::Integer(value) if opt.name == name => Some(value),
        _ => None,
    })
}

fn bool_option(options: &[CommandDataOption], name: &str) -> Option<bool> {
    options.iter().find_map(|opt| match opt.value {
        CommandDataOptionValue::Boolean(value) if opt.name == name => Some(value),
        _ => None,
    })
}

fn user_option(options: &[CommandDataOption], name: &str) -> Option<UserId> {
    options.iter().find_map(|opt| match opt.value {
        CommandDataOptionValue::User(value) if opt.name == name => Some(UserId(value.get())),
        _ => None,
    })
}
