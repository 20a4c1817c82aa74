use crate::core::model::{GenerationRequest, Panel};

/// System and user instructions for one outline request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlinePrompt {
    pub system: String,
    pub user: String,
}

pub fn outline_prompt(request: &GenerationRequest, panel_count: u32) -> OutlinePrompt {
    OutlinePrompt {
        system: outline_system_prompt(panel_count),
        user: outline_user_prompt(request, panel_count),
    }
}

pub fn outline_system_prompt(panel_count: u32) -> String {
    format!(
        "You are a creative children's comic book writer. Create engaging, age-appropriate stories.\n\
         Generate a comic story with exactly {} panels.\n\
         \n\
         Return ONLY a valid JSON object with this structure:\n\
         {{\n  \
           \"title\": \"Comic Title\",\n  \
           \"panels\": [\n    \
             {{\n      \
               \"panelNumber\": 1,\n      \
               \"description\": \"Visual description of what's happening\",\n      \
               \"dialogue\": \"Character dialogue or narration\"\n    \
             }}\n  \
           ]\n\
         }}",
        panel_count
    )
}

pub fn outline_user_prompt(request: &GenerationRequest, panel_count: u32) -> String {
    let age = request.child_age;
    format!(
        "Create a {age}-year-old appropriate comic story about: \"{idea}\"\n\
         \n\
         Requirements:\n\
         - Exactly {count} panels\n\
         - Age-appropriate for {age} years old\n\
         - Engaging and fun\n\
         - Each panel should have clear visual description and dialogue\n\
         - Story should have beginning, middle, and end\n\
         \n\
         Return only the JSON, no other text.",
        age = age,
        idea = request.prompt.trim(),
        count = panel_count,
    )
}

/// Image instruction for one panel. The style directive is repeated for
/// every panel since the image model keeps no memory between calls.
pub fn image_prompt(panel: &Panel) -> String {
    format!(
        "Comic book style illustration: {}\n\
         \n\
         Style: Colorful, vibrant comic book art style suitable for children.\n\
         Clean lines, bright colors, friendly and engaging.\n\
         Professional comic book illustration.",
        panel.description.trim()
    )
}
