use skyrealm_common::Location;

/// Substituted when the service answers with no text.
pub const SILENT_WIND: &str = "...the wind is silent...";

/// Substituted when the request fails for any reason.
pub const LOST_WORDS: &str = "The wind howls, but the words are lost.";

/// Upper bound on whisper length requested from the model.
pub const MAX_WORDS: u32 = 40;

/// Build the Wind Shepherd prompt for a location.
pub fn whisper_prompt(location: Location) -> String {
    format!(
        "You are the \"Wind Shepherd\" of a surreal, minimalist world called \"Sky Realm\".\n\
         The visual theme is: Breathing, Boundless, Crystalline, Time-Eroded.\n\
         \n\
         The user is currently standing at: {location}.\n\
         \n\
         Describe what the wind whispers to them.\n\
         Keep it short (under {MAX_WORDS} words).\n\
         Style: Poetic, lonely but beautiful, emphasizing the scale of the giant eroded white ruins and the flow of light.\n\
         Do not be conversational. Just the whisper of the world."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_location_name() {
        for location in Location::ALL {
            let prompt = whisper_prompt(location);
            assert!(prompt.contains(location.name()), "{prompt}");
        }
    }

    #[test]
    fn prompt_carries_style_directive() {
        let prompt = whisper_prompt(Location::MirrorVoid);
        assert!(prompt.contains("Wind Shepherd"));
        assert!(prompt.contains("under 40 words"));
        assert!(prompt.contains("Do not be conversational"));
    }

    #[test]
    fn placeholders_differ() {
        assert_ne!(SILENT_WIND, LOST_WORDS);
    }
}
