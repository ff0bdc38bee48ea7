//! Prompt templates for the two query modes.

use crate::models::NotificationRecord;

/// Joins the context blocks of `records`, numbered from 1.
pub fn records_context<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a NotificationRecord>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(idx, rec)| rec.to_context_block(idx + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instruction for questions about the notification records.
pub fn notification_prompt(context: &str, query: &str) -> String {
    format!(
        "You are an experienced municipal inspection agent. Analyze the user's query about \
the notifications and give a professional, detailed answer. Follow these guidelines:

1. Identify the information most relevant to the query
2. Organize the answer in a clear, structured way
3. Use appropriate technical language
4. Cite specific numbers, addresses and dates when available
5. Suggest next steps or recommendations when appropriate

Available notification data:
{context}

User query: {query}

Answer as an inspection agent, keeping a professional and helpful tone, in the language of the query."
    )
}

/// Instruction for questions about the building code.
pub fn building_code_prompt(document: &str, question: &str) -> String {
    format!(
        "You are a specialist in municipal legislation and building codes. Analyze the user's \
question and give a precise technical answer, following these guidelines:

1. Cite the specific articles of the building code relevant to the question
2. Explain the regulations clearly and objectively
3. Use technical but accessible language
4. Give practical examples when pertinent
5. Point out possible exceptions or special cases

Building code:
{document}

User question: {question}

Answer as a municipal legislation specialist, keeping a technical and professional tone, in the language of the question."
    )
}
