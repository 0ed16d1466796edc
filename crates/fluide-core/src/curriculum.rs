//! The weekly plan: one theme per weekday, five builtin chunks per themed day,
//! and two "mixed" days that pool every practice theme.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::chunks::{Chunk, ChunkOrigin, CustomChunkStore};

/// Theme keys. The label is also the key in the custom chunk record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    #[serde(rename = "Opinions")]
    Opinions,
    #[serde(rename = "Desires & Intentions")]
    DesiresAndIntentions,
    #[serde(rename = "Obligations")]
    Obligations,
    #[serde(rename = "Difficulties")]
    Difficulties,
    #[serde(rename = "Interaction")]
    Interaction,
    #[serde(rename = "Active Listening")]
    ActiveListening,
    #[serde(rename = "Weekly Review")]
    WeeklyReview,
}

impl Theme {
    /// Themes that carry chunks, in curriculum order.
    pub const PRACTICE: [Theme; 5] = [
        Theme::Opinions,
        Theme::DesiresAndIntentions,
        Theme::Obligations,
        Theme::Difficulties,
        Theme::Interaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Opinions => "Opinions",
            Theme::DesiresAndIntentions => "Desires & Intentions",
            Theme::Obligations => "Obligations",
            Theme::Difficulties => "Difficulties",
            Theme::Interaction => "Interaction",
            Theme::ActiveListening => "Active Listening",
            Theme::WeeklyReview => "Weekly Review",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    /// Accepts the label ("Desires & Intentions") or a short slug ("desires").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        let theme = match needle.as_str() {
            "opinions" => Theme::Opinions,
            "desires & intentions" | "desires" | "intentions" => Theme::DesiresAndIntentions,
            "obligations" => Theme::Obligations,
            "difficulties" => Theme::Difficulties,
            "interaction" => Theme::Interaction,
            "active listening" | "listening" => Theme::ActiveListening,
            "weekly review" | "review" => Theme::WeeklyReview,
            _ => return Err(format!("unknown theme: {s}")),
        };
        Ok(theme)
    }
}

/// What a day practices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayContent {
    /// A fixed list of builtin chunks for the day's theme.
    Fixed(Vec<Chunk>),
    /// Pool these themes (builtin and custom) and follow the task.
    Mixed { themes: Vec<Theme>, task: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub day: Weekday,
    pub theme: String,
    pub description: String,
    pub theme_key: Theme,
    pub content: DayContent,
}

impl DayPlan {
    pub fn is_mixed(&self) -> bool {
        matches!(self.content, DayContent::Mixed { .. })
    }

    pub fn task(&self) -> Option<&str> {
        match &self.content {
            DayContent::Mixed { task, .. } => Some(task),
            DayContent::Fixed(_) => None,
        }
    }
}

/// Read-only lookup of day plans.
pub trait Curriculum {
    fn plan(&self, day: Weekday) -> Option<&DayPlan>;

    /// Builtin chunks of the themed day whose key is `theme`.
    fn builtin_for_theme(&self, theme: Theme) -> &[Chunk];
}

/// The standard seven-day French plan.
#[derive(Debug, Clone)]
pub struct WeeklyPlan {
    days: Vec<DayPlan>,
}

impl Default for WeeklyPlan {
    fn default() -> Self {
        Self::standard()
    }
}

impl WeeklyPlan {
    pub fn new(days: Vec<DayPlan>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[DayPlan] {
        &self.days
    }

    pub fn standard() -> Self {
        let fixed = |day, theme: Theme, description: &str, chunks: &[(&str, &str, &str)]| DayPlan {
            day,
            theme: theme.as_str().to_string(),
            description: description.to_string(),
            theme_key: theme,
            content: DayContent::Fixed(
                chunks
                    .iter()
                    .map(|(id, text, translation)| Chunk::builtin(id, text, translation))
                    .collect(),
            ),
        };
        let mixed = |day, theme: Theme, description: &str, task: &str| DayPlan {
            day,
            theme: theme.as_str().to_string(),
            description: description.to_string(),
            theme_key: theme,
            content: DayContent::Mixed {
                themes: Theme::PRACTICE.to_vec(),
                task: task.to_string(),
            },
        };

        Self::new(vec![
            fixed(
                Weekday::Mon,
                Theme::Opinions,
                "Learn to give your opinion without hesitation.",
                &[
                    ("m1", "À mon avis", "In my opinion"),
                    ("m2", "Je pense que", "I think that"),
                    ("m3", "J'ai l'impression que", "I get the feeling that"),
                    ("m4", "Selon moi", "According to me"),
                    ("m5", "Je trouve que", "I find that"),
                ],
            ),
            fixed(
                Weekday::Tue,
                Theme::DesiresAndIntentions,
                "Express what you want or plan to do.",
                &[
                    ("t1", "J'ai envie de", "I feel like / I want to"),
                    ("t2", "J'aimerais bien", "I would really like"),
                    ("t3", "J'ai décidé de", "I decided to"),
                    ("t4", "J'essaie de", "I am trying to"),
                    ("t5", "Je compte", "I plan to / I intend to"),
                ],
            ),
            fixed(
                Weekday::Wed,
                Theme::Obligations,
                "Express necessity and importance.",
                &[
                    ("w1", "Il faut que", "It is necessary that"),
                    ("w2", "Je dois absolument", "I absolutely must"),
                    ("w3", "C'est important de", "It is important to"),
                    ("w4", "Il est nécessaire de", "It is necessary to"),
                    ("w5", "J'ai besoin de", "I need to"),
                ],
            ),
            fixed(
                Weekday::Thu,
                Theme::Difficulties,
                "Explain what is hard or complicated.",
                &[
                    ("th1", "J'ai du mal à", "I have a hard time"),
                    ("th2", "Je n'arrive pas à", "I can't seem to / I can't manage to"),
                    ("th3", "C'est compliqué de", "It's complicated to"),
                    ("th4", "Je suis incapable de", "I am unable to"),
                    ("th5", "Ce n'est pas facile de", "It's not easy to"),
                ],
            ),
            fixed(
                Weekday::Fri,
                Theme::Interaction,
                "Questions to keep a conversation going.",
                &[
                    ("f1", "Qu'en penses-tu ?", "What do you think about it?"),
                    ("f2", "Tu es d'accord ?", "Do you agree?"),
                    ("f3", "C'est vrai que", "It's true that"),
                    ("f4", "Tu vois ce que je veux dire ?", "Do you see what I mean?"),
                    ("f5", "Pas du tout", "Not at all"),
                ],
            ),
            mixed(
                Weekday::Sat,
                Theme::ActiveListening,
                "Identify chunks in real content.",
                "Watch a 5-minute video in French. Write down 3 chunks you recognize.",
            ),
            mixed(
                Weekday::Sun,
                Theme::WeeklyReview,
                "Consolidate everything from the week.",
                "Pick one chunk from each day and tell a short story.",
            ),
        ])
    }
}

impl Curriculum for WeeklyPlan {
    fn plan(&self, day: Weekday) -> Option<&DayPlan> {
        self.days.iter().find(|p| p.day == day)
    }

    fn builtin_for_theme(&self, theme: Theme) -> &[Chunk] {
        self.days
            .iter()
            .find_map(|p| match &p.content {
                DayContent::Fixed(chunks) if p.theme_key == theme => Some(chunks.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Chunks offered on `day`: builtin first, then the learner's own.
///
/// Mixed days repeat that pattern per pooled theme, in theme order.
pub fn list_for_day<C: Curriculum + ?Sized>(
    day: Weekday,
    custom: &CustomChunkStore,
    curriculum: &C,
) -> Vec<Chunk> {
    let Some(plan) = curriculum.plan(day) else {
        return Vec::new();
    };

    let themed = |theme: Theme, builtin: &[Chunk], out: &mut Vec<Chunk>| {
        out.extend(builtin.iter().map(|c| c.tagged(ChunkOrigin::Builtin)));
        if let Some(own) = custom.get(theme.as_str()) {
            out.extend(own.iter().map(|c| c.tagged(ChunkOrigin::Custom)));
        }
    };

    let mut out = Vec::new();
    match &plan.content {
        DayContent::Fixed(chunks) => themed(plan.theme_key, chunks, &mut out),
        DayContent::Mixed { themes, .. } => {
            for theme in themes {
                themed(*theme, curriculum.builtin_for_theme(*theme), &mut out);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(id: &str, text: &str) -> Chunk {
        Chunk {
            origin: ChunkOrigin::Custom,
            ..Chunk::builtin(id, text, "translation")
        }
    }

    #[test]
    fn standard_plan_covers_the_week() {
        let plan = WeeklyPlan::standard();
        assert_eq!(plan.days().len(), 7);
        assert!(plan.plan(Weekday::Sat).unwrap().is_mixed());
        assert!(plan.plan(Weekday::Sun).unwrap().task().is_some());
        assert_eq!(plan.builtin_for_theme(Theme::Obligations).len(), 5);
        assert!(plan.builtin_for_theme(Theme::WeeklyReview).is_empty());
    }

    #[test]
    fn normal_day_lists_builtin_then_custom() {
        let plan = WeeklyPlan::standard();
        let mut store = CustomChunkStore::new();
        store.insert("Opinions".into(), vec![custom("c1", "Pour moi")]);
        store.insert("Obligations".into(), vec![custom("c2", "Il vaut mieux")]);

        let chunks = list_for_day(Weekday::Mon, &store, &plan);
        assert_eq!(chunks.len(), 6);
        assert!(chunks[..5].iter().all(|c| c.origin == ChunkOrigin::Builtin));
        assert_eq!(chunks[5].id, "c1");
        assert!(chunks[5].is_custom());
    }

    #[test]
    fn mixed_day_pools_themes_in_order() {
        let plan = WeeklyPlan::standard();
        let mut store = CustomChunkStore::new();
        store.insert("Interaction".into(), vec![custom("ci", "Et toi ?")]);
        store.insert("Opinions".into(), vec![custom("co", "Pour moi")]);

        let chunks = list_for_day(Weekday::Sun, &store, &plan);
        assert_eq!(chunks.len(), 27);
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(&ids[..6], &["m1", "m2", "m3", "m4", "m5", "co"]);
        assert_eq!(ids[6], "t1");
        assert_eq!(ids[26], "ci");
        assert!(chunks[5].is_custom());
        assert!(!chunks[6].is_custom());
    }

    #[test]
    fn unknown_day_is_empty() {
        let plan = WeeklyPlan::new(Vec::new());
        assert!(list_for_day(Weekday::Mon, &CustomChunkStore::new(), &plan).is_empty());
    }

    #[test]
    fn theme_parses_labels_and_slugs() {
        assert_eq!("Desires & Intentions".parse::<Theme>().unwrap(), Theme::DesiresAndIntentions);
        assert_eq!("review".parse::<Theme>().unwrap(), Theme::WeeklyReview);
        assert!("Cooking".parse::<Theme>().is_err());
    }
}
