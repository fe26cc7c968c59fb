//! Prompt construction for villager replies.
//!
//! The prompt has two parts: a persona/context description assembled from
//! the agent's profile, environment, and recent history, followed by the
//! literal utterance. Section order is fixed so generated behavior stays
//! comparable across backends.

use hamlet_types::agent::InteractionRecord;
use hamlet_types::conversation::ConversationContext;

/// Render the full generation prompt for one exchange.
pub fn build_prompt(
    villager_name: &str,
    profession: Option<&str>,
    ctx: &ConversationContext,
    recent: &[InteractionRecord],
) -> String {
    let mut prompt = String::new();

    match profession {
        Some(profession) => {
            prompt.push_str(&format!(
                "You are {villager_name}, a {profession} living in a small village.\n"
            ));
        }
        None => {
            prompt.push_str(&format!(
                "You are {villager_name}, a villager in a small village.\n"
            ));
        }
    }

    prompt.push_str(&format!(
        "It is {} and the weather is {}. You are at {}.\n",
        ctx.environment.time_of_day, ctx.environment.weather, ctx.environment.location_label
    ));

    if let Some(relationship) = &ctx.relationship {
        prompt.push_str(&format!(
            "You consider {} a {relationship}.\n",
            ctx.speaker
        ));
    }

    if let Some(nearby) = &ctx.nearby_summary {
        prompt.push_str(&format!("Also nearby: {nearby}.\n"));
    }

    if !recent.is_empty() {
        prompt.push_str("\nRecent exchanges:\n");
        for record in recent {
            prompt.push_str(&format!(
                "{}: {}\n{}: {}\n",
                record.speaker, record.utterance, villager_name, record.reply
            ));
        }
    }

    prompt.push_str(
        "\nReply in character with one or two short spoken sentences. \
         Do not narrate actions or break character.\n",
    );
    prompt.push_str(&format!("\n{} says: {}", ctx.speaker, ctx.message));

    prompt
}
