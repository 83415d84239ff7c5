//! Context-aware coaching chat. The user's profile, insight, interview
//! history, resume and roadmaps are rendered into the system prompt; the
//! reply is plain text and a failed model call is surfaced to the caller.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::context::UserContext;
use crate::chat::prompts::{
    CHAT_SYSTEM_TEMPLATE, NOT_SPECIFIED, NO_ANALYTICS, NO_INSIGHTS, NO_RESUME, NO_ROADMAPS,
    NO_SESSIONS,
};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;

const TRANSCRIPT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

fn or_not_specified(value: String) -> String {
    if value.trim().is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        value
    }
}

fn profile_section(ctx: &UserContext) -> String {
    let user = &ctx.user;
    format!(
        "- Name: {}\n- Email: {}\n- Industry: {}\n- Skills: {}",
        or_not_specified(user.name.clone().unwrap_or_default()),
        or_not_specified(user.email.clone()),
        or_not_specified(user.industry.clone().unwrap_or_default()),
        or_not_specified(user.skills.join(", ")),
    )
}

fn insights_section(ctx: &UserContext) -> String {
    let Some(insight) = &ctx.insight else {
        return NO_INSIGHTS.to_string();
    };
    format!(
        "- Industry: {}\n- Growth Rate: {}%\n- Demand Level: {}\n- Market Outlook: {}\n\
         - Top Skills in Demand: {}\n- Key Trends: {}\n- Recommended Skills: {}\n- Salary Ranges: {}",
        insight.industry,
        insight.growth_rate,
        insight.demand_level,
        insight.market_outlook,
        insight.top_skills.join(", "),
        insight.key_trends.join(", "),
        insight.recommended_skills.join(", "),
        insight.salary_ranges,
    )
}

fn sessions_section(ctx: &UserContext) -> String {
    if ctx.sessions.is_empty() {
        return NO_SESSIONS.to_string();
    }
    ctx.sessions
        .iter()
        .map(|s| {
            format!(
                "* {} interview ({} - {}), status {}\n  Overall Score: {}\n  Strengths: {}\n  Weaknesses: {}\n  Detailed Feedback: {}",
                s.session_type,
                s.role,
                s.difficulty,
                s.status,
                s.overall_score
                    .map(|score| score.to_string())
                    .unwrap_or_else(|| "Not scored".to_string()),
                s.strengths.join(", "),
                s.weaknesses.join(", "),
                s.detailed_feedback.as_deref().unwrap_or("N/A"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn analytics_section(ctx: &UserContext) -> String {
    if ctx.analytics.is_empty() {
        return NO_ANALYTICS.to_string();
    }
    ctx.analytics
        .iter()
        .map(|a| {
            let duration = match (a.started_at, a.ended_at) {
                (Some(start), Some(end)) => format!("{}s", (end - start).num_seconds()),
                _ => "unknown".to_string(),
            };
            let preview: String = a.transcript.chars().take(TRANSCRIPT_PREVIEW_CHARS).collect();
            let preview = match preview.trim() {
                "" => "No transcript available",
                p => p,
            };
            format!(
                "* Session {}\n  Duration: {duration}\n  Transcript Preview: \"{preview}\"",
                a.session_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn resume_section(ctx: &UserContext) -> String {
    let Some(resume) = &ctx.resume else {
        return NO_RESUME.to_string();
    };
    if resume.content.trim().is_empty() {
        return NO_RESUME.to_string();
    }
    format!(
        "Content:\n{}\nATS Score: {}\nFeedback: {}\nLast Updated: {}",
        resume.content.trim(),
        resume
            .ats_score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "Not assessed".to_string()),
        resume
            .feedback
            .as_ref()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "No feedback available".to_string()),
        resume.updated_at.format("%Y-%m-%d"),
    )
}

fn roadmaps_section(ctx: &UserContext) -> String {
    if ctx.roadmaps.is_empty() {
        return NO_ROADMAPS.to_string();
    }
    ctx.roadmaps
        .iter()
        .map(|r| format!("- {} / {} ({})", r.domain, r.subdomain, r.status))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_system_prompt(ctx: &UserContext) -> String {
    CHAT_SYSTEM_TEMPLATE
        .replace("{profile}", &profile_section(ctx))
        .replace("{insights}", &insights_section(ctx))
        .replace("{sessions}", &sessions_section(ctx))
        .replace("{analytics}", &analytics_section(ctx))
        .replace("{resume}", &resume_section(ctx))
        .replace("{roadmaps}", &roadmaps_section(ctx))
}

pub async fn reply(
    generator: &dyn TextGenerator,
    ctx: &UserContext,
    request: &ChatRequest,
) -> Result<ChatResponse, AppError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let system = build_system_prompt(ctx);
    let reply = generator.generate(message, &system).await?;
    info!("Chat reply for user {} ({} chars)", ctx.user.id, reply.len());

    Ok(ChatResponse {
        reply: reply.trim().to_string(),
    })
}
