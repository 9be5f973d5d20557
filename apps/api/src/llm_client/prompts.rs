// Prompt text shared by both providers. Kept in one place so the guardrail
// sentence the chat UI matches on cannot drift between backends.

/// Reply the assistant must give, verbatim, to anything off-topic.
pub const OFF_TOPIC_REFUSAL: &str =
    "I am an AI Career Assistant. I can only answer questions related to jobs and careers.";

/// Used when the provider answers a chat turn with no text at all.
pub const EMPTY_REPLY_FALLBACK: &str = "I am unable to process that at this time.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

pub const SKILL_GAP_PROMPT_TEMPLATE: &str = r#"You are an expert tech recruiter and AI career coach.
I will provide a candidate's resume text and their target role.

Resume text:
"{resume_text}"

Target Role: "{target_role}"

Task:
1. Extract the candidate's skills, years of experience, and highest education level from the resume.
2. Identify the required skills for the Target Role.
3. Compare the candidate's skills against the required skills to calculate a match percentage (0-100).
4. List the exact matches and missing skills.
5. Provide a brief explanation of why this percentage was given.
6. Draft a 4-milestone learning roadmap to help them acquire the missing skills.

Output ONLY a valid JSON object with the exact following schema:
{
  "extractedProfile": {
    "skills": ["string"],
    "experienceYears": number,
    "educationLevel": "string"
  },
  "matchData": {
    "percentage": number,
    "matchedSkills": ["string"],
    "missingSkills": ["string"],
    "aiExplanation": "string"
  },
  "roadmap": {
    "estimatedCompletionWeeks": number,
    "milestones": [
      {
        "stepOrder": number,
        "focusArea": "string",
        "description": "string",
        "recommendedResources": [
          { "title": "string", "url": "string", "type": "article/video/course" }
        ],
        "skillsAddressed": ["string"]
      }
    ]
  }
}"#;

const CAREER_ASSISTANT_SYSTEM: &str = "You are Jobvista Pro AI, a strict, expert career copilot and recruitment assistant.
Your sole purpose is to help users navigate their careers, build skills, parse resumes, and prepare for interviews.
CRITICAL INSTRUCTION 1: Your answers MUST be EXTRAORDINARILY SHORT and concise. Use simple, direct language. Never write more than 2 or 3 short sentences.
CRITICAL INSTRUCTION 2: If a user asks ANYTHING outside of careers, tech, recruiting, parsing resumes, or jobs (for example: coding scripts unrelated to an interview, asking for recipes, general knowledge, math, chatting about sports, politics, etc.), you MUST decline politely by saying EXACTLY: \"{refusal}\"";

/// Fills both placeholders in one pass over the template, so neither input is
/// ever scanned for placeholders itself.
pub fn skill_gap_prompt(resume_text: &str, target_role: &str) -> String {
    let mut prompt = String::with_capacity(
        SKILL_GAP_PROMPT_TEMPLATE.len() + resume_text.len() + target_role.len(),
    );
    let mut rest = SKILL_GAP_PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{resume_text}") {
            prompt.push_str(resume_text);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{target_role}") {
            prompt.push_str(target_role);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}

/// Builds the per-request system instruction for a chat turn.
/// The briefing section is omitted entirely when there is nothing to say.
pub fn career_assistant_system(briefing: &str) -> String {
    let mut system = CAREER_ASSISTANT_SYSTEM.replace("{refusal}", OFF_TOPIC_REFUSAL);
    let briefing = briefing.trim();
    if !briefing.is_empty() {
        system.push_str("\n\nUSER CONTEXT:\n");
        system.push_str(briefing);
    }
    system
}
