//! Push-event handler that turns channel messages into dispatch jobs.
//!
//! Watches plain messages and app mentions for the inline `@dispatch`
//! grammar. Recognized commands are queued with their Slack context so
//! results can be threaded back; messages that carry the trigger but
//! fail to parse get a usage hint instead of silence.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector, SlackEventCallbackBody,
    SlackPushEventCallback,
};
use tracing::{info, warn};

use crate::dispatch::orchestrator::Orchestrator;
use crate::dispatch::parser::{self, DispatchCommand};
use crate::models::dispatch::DispatchRequest;
use crate::slack::SlackService;

const USAGE_HINT: &str = "Could not parse that dispatch. Usage: \
`@dispatch [--track] [--repo=/path] [target:]agent: task` \
(agents: claude, gemini, qwen, cline; targets: hetzner, mac, cold_storage)";

/// Shared state handed to the Socket Mode listener.
pub struct ListenerState {
    /// Dispatch orchestrator the listener queues jobs into.
    pub orchestrator: Arc<Orchestrator>,
    /// Outgoing Slack queue for acks and hints.
    pub slack: Arc<SlackService>,
}

/// A message worth inspecting, reduced to the fields the parser needs.
struct InboundMessage {
    channel: String,
    ts: String,
    thread_ts: Option<String>,
    user: Option<String>,
    text: String,
}

fn extract(event: &SlackPushEventCallback) -> Option<InboundMessage> {
    match &event.event {
        SlackEventCallbackBody::Message(msg) => {
            // Bot echoes and edits would loop us back into ourselves.
            if msg.sender.bot_id.is_some() || msg.subtype.is_some() {
                return None;
            }
            Some(InboundMessage {
                channel: msg.origin.channel.as_ref()?.to_string(),
                ts: msg.origin.ts.to_string(),
                thread_ts: msg.origin.thread_ts.as_ref().map(ToString::to_string),
                user: msg.sender.user.as_ref().map(ToString::to_string),
                text: msg.content.as_ref()?.text.clone()?,
            })
        }
        SlackEventCallbackBody::AppMention(mention) => Some(InboundMessage {
            channel: mention.channel.to_string(),
            ts: mention.origin.ts.to_string(),
            thread_ts: mention.origin.thread_ts.as_ref().map(ToString::to_string),
            user: Some(mention.user.to_string()),
            text: mention.content.text.clone()?,
        }),
        _ => None,
    }
}

fn to_request(command: DispatchCommand, message: &InboundMessage) -> DispatchRequest {
    let mut request = DispatchRequest::new(command.agent, command.target, command.task);
    request.repo_path = command.repo_path;
    request.track_as_task = command.track_as_task;
    request.slack_message_ts = Some(message.ts.clone());
    request.slack_channel_id = Some(message.channel.clone());
    request.slack_thread_ts = Some(message.thread_ts.clone().unwrap_or_else(|| message.ts.clone()));
    request.dispatched_by = message.user.clone();
    request
}

/// Handle message and app-mention push events delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; delivery problems are logged and acknowledged so Slack
/// does not redeliver the event.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let listener: Option<Arc<ListenerState>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<ListenerState>>().cloned()
    };
    let Some(listener) = listener else {
        warn!("listener state not available; dropping push event");
        return Ok(());
    };

    let Some(message) = extract(&event) else {
        return Ok(());
    };
    if !parser::is_dispatch_command(&message.text) {
        return Ok(());
    }

    let Some(command) = parser::parse_dispatch_command(&message.text) else {
        info!(channel = %message.channel, "dispatch trigger without valid command");
        reply(&listener.slack, &message, USAGE_HINT).await;
        return Ok(());
    };

    let request = to_request(command, &message);
    let agent = request.agent;
    let target = request.target;
    match listener.orchestrator.queue_dispatch(request).await {
        Ok(job) => {
            info!(job_id = job.id, "queued dispatch from slack");
            let ack = format!(
                "\u{1f916} Dispatching to *{}:{}* (job {})",
                target.as_str(),
                agent.as_str(),
                job.id
            );
            reply(&listener.slack, &message, &ack).await;
        }
        Err(err) => {
            warn!(%err, "failed to queue dispatch from slack");
            reply(&listener.slack, &message, &format!("Dispatch failed: {err}")).await;
        }
    }

    Ok(())
}

async fn reply(slack: &SlackService, message: &InboundMessage, text: &str) {
    let thread = message.thread_ts.as_deref().unwrap_or(&message.ts);
    if let Err(err) = slack.post_thread_reply(&message.channel, thread, text).await {
        warn!(%err, "failed to post slack reply");
    }
}
