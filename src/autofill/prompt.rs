//! Prompt templates and response parsing for both answer strategies.

use super::models::FieldDescriptor;
use crate::config::UNKNOWN_ANSWER;
use crate::error::AutofillError;

/// Prompt asking for a single field's value.
pub fn single_field_prompt(context: &str, field: &FieldDescriptor) -> String {
    format!(
        "Human: Use the following context to answer the question:\n\n\
         Context: {}\n\n\
         Question: Based on the document, what is the '{}'?{} \
         Provide only the required information.\n\nAI: ",
        context,
        field.label,
        hint_suffix(field)
    )
}

/// Prompt asking for every field of a batch, one numbered line each.
pub fn batch_prompt(context: &str, fields: &[FieldDescriptor]) -> String {
    let questions = fields
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{}. {}{}", i + 1, field.label, hint_suffix(field)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Use the following context to fill in a form.\n\n\
         Context:\n{}\n\n\
         Questions:\n{}\n\n\
         Answer every question on its own line as \"<number>: <answer>\", using the \
         question numbers above and nothing else. Provide only the required information. \
         If the context does not contain the answer, reply \"<number>: {}\".",
        context, questions, UNKNOWN_ANSWER
    )
}

/// Query used to retrieve context for a whole batch.
pub fn batch_query(fields: &[FieldDescriptor]) -> String {
    fields
        .iter()
        .map(|f| f.label.as_str())
        .filter(|label| !label.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn hint_suffix(field: &FieldDescriptor) -> String {
    let hints = field.hints();
    if hints.is_empty() {
        String::new()
    } else {
        format!(" ({})", hints.join("; "))
    }
}

/// Answers recovered from a batched response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnswers {
    /// One slot per field; `None` where the response had no answer for it.
    pub answers: Vec<Option<String>>,
    /// Answer lines that matched no field: unknown or repeated numbers, or
    /// unnumbered lines that could not be zipped by position.
    pub surplus: usize,
}

impl ParsedAnswers {
    pub fn matched(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Missing or surplus answers, if any.
    pub fn mismatch(&self) -> Option<AutofillError> {
        let matched = self.matched();
        if matched == self.answers.len() && self.surplus == 0 {
            return None;
        }
        Some(AutofillError::ResponseParseMismatch {
            expected: self.answers.len(),
            found: matched + self.surplus,
        })
    }
}

/// Map a batched response back onto its fields.
///
/// Numbered lines (`3: value`, `3. value`, `3) value`) are matched by number;
/// the first answer for a number wins. A response with no numbered lines is
/// zipped by position only when its line count equals the field count.
pub fn parse_batch_response(text: &str, fields: &[FieldDescriptor]) -> ParsedAnswers {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut answers: Vec<Option<String>> = vec![None; fields.len()];
    let mut surplus = 0;
    let mut keyed = false;

    for line in &lines {
        if let Some((number, value)) = split_numbered(line) {
            keyed = true;
            match number.checked_sub(1).and_then(|i| answers.get_mut(i)) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(strip_label(value, &fields[number - 1]));
                }
                _ => surplus += 1,
            }
        }
    }

    if !keyed {
        if lines.len() == fields.len() {
            for ((slot, line), field) in answers.iter_mut().zip(&lines).zip(fields) {
                *slot = Some(strip_label(line, field));
            }
        } else {
            surplus = lines.len();
        }
    }

    ParsedAnswers { answers, surplus }
}

/// `"12: value"` → `(12, "value")`. Also accepts `.` and `)` after the number.
fn split_numbered(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_start_matches(|c: char| c == '-' || c == '*').trim_start();
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let number = line[..digits].parse().ok()?;
    let rest = &line[digits..];
    let value = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('.'))
        .or_else(|| rest.strip_prefix(')'))?;
    // "1.5 kg" is a value, not question 1
    if !value.is_empty() && !value.starts_with(char::is_whitespace) {
        return None;
    }
    Some((number, value.trim()))
}

/// Drop a leading `"<label>:"` when the model echoes the question back.
fn strip_label(value: &str, field: &FieldDescriptor) -> String {
    let value = value.trim();
    if let Some((head, tail)) = value.split_once(':') {
        if !field.label.is_empty() && head.trim().eq_ignore_ascii_case(field.label.trim()) {
            return tail.trim().to_string();
        }
    }
    value.to_string()
}
