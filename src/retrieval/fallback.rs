//! Curated built-in exemplars
//!
//! Used whenever the vector service is disabled, unreachable or returns no
//! rows. Every mode has at least one entry.

use super::Exemplar;
use crate::types::Mode;

const SALES: &[(&str, &str)] = &[
    (
        "retail promotion",
        "You're going to love this. We've slashed prices by 40% and thrown in free delivery. \
         No catches, no hidden fees. Just brilliant value that'll make you smile. \
         Grab yours before they're gone, because this deal won't last forever.",
    ),
    (
        "software subscription",
        "Here's the thing. You didn't start a business to spend Sunday nights on invoices. \
         So don't. Our app sends them, chases them and files them while you get on with the \
         work you actually enjoy. Try it free for a month and see how much time you get back.",
    ),
    (
        "local service",
        "Burst pipe at 2am? We've been there. Call us and a real plumber picks up, not a \
         robot. We'll be round within the hour, we'll tell you the price before we touch \
         anything, and we won't leave until it's sorted.",
    ),
];

const JOURNALIST: &[(&str, &str)] = &[
    (
        "local planning",
        "Local residents gathered today to protest the proposed development. The crowd, \
         numbering around 200, voiced concerns about increased traffic and environmental \
         impact. 'We're not against progress,' said Sarah Mitchell, a local teacher. \
         'But this feels rushed.' Council representatives promised to review the feedback \
         before next month's decision.",
    ),
    (
        "transport",
        "The 7.42 from Leeds was cancelled again on Monday. Third time this month. \
         Commuters on the platform shrugged, checked their phones and started calling work. \
         The operator blamed a shortage of drivers and said a new timetable would arrive in \
         spring, a promise regular passengers have heard before.",
    ),
    (
        "business",
        "Shares in the chipmaker fell 12% by mid-afternoon after it cut its forecast for the \
         second time this year. Analysts had expected a slowdown. Not this one. \
         The chief executive told investors the weakness was temporary, though she declined \
         to say when orders would recover.",
    ),
];

/// Curated exemplars for `mode`, at most `k` (and never fewer than one)
pub fn curated(mode: Mode, k: usize) -> Vec<Exemplar> {
    let entries = match mode {
        Mode::Sales => SALES,
        Mode::Journalist => JOURNALIST,
    };

    entries
        .iter()
        .take(k.max(1))
        .map(|(topic, content)| Exemplar {
            content: (*content).to_string(),
            content_type: mode,
            topic: Some((*topic).to_string()),
            similarity: 0.0,
        })
        .collect()
}
