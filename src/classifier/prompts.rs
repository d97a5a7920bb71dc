//! Instruction text for each classification task.

/// Build the system instruction for correcting a typo in a field value.
pub fn correct_typo(field: &str, text: &str) -> String {
    format!(
        "The user entered '{text}' for the field '{field}'.\n\
         If there are any typos or errors in the input, correct it and provide the most likely intended value.\n\
         If the input is already correct, return it as-is."
    )
}

pub fn infer_subcategory<'a>(text: &str, subcategories: impl Iterator<Item = &'a str>) -> String {
    let options = subcategories
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Given the user input: '{text}', determine the most relevant subcategory from the following list:\n\
         [{options}].\n\
         Respond with exactly one item from the list, spelled as it appears.\n\
         If no clear match is found, return an empty string."
    )
}

pub fn infer_purpose(subcategory: &str, text: &str) -> String {
    format!(
        "Based on the drill subcategory '{}' and the user input: '{text}',\n\
         determine the most likely purpose of the event.\n\
         The possible purposes are 'Innovation' or 'Hiring'.\n\
         If the input strongly suggests one of these purposes, return it.\n\
         Otherwise, default to 'Innovation'.",
        subcategory.to_uppercase()
    )
}

pub fn infer_yes_no(text: &str) -> String {
    format!(
        "Given the user input: '{text}', determine whether the response indicates 'Yes' or 'No'.\n\
         Return 'Yes' if the input strongly suggests affirmation, otherwise return 'No'."
    )
}

pub fn detect_cancellation(text: &str) -> String {
    format!(
        "Given the user input: '{text}', determine whether the user wants to cancel the registration process.\n\
         Return 'True' if the input strongly suggests cancellation (e.g., 'cancel', 'stop', 'don't want to proceed'), \
         otherwise return 'False'."
    )
}

pub fn generate_description(name: &str, drill_type: &str, purpose: &str) -> String {
    format!(
        "Generate a short description for the following event:\n\
         Name: {name}\n\
         Type: {drill_type}\n\
         Purpose: {purpose}"
    )
}
