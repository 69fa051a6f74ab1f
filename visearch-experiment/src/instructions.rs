use crate::config::ExperimentConfig;
use visearch_core::{ResponseKey, Target, Version};

/// Instruction screens shown between trial runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Welcome,
    Task,
    TrainingIntro,
    ExperimentIntro,
    /// 1-based block number
    BlockIntro(usize),
    /// Rest after the given 1-based block
    Break(usize),
    Goodbye,
}

struct KeyHint {
    color: &'static str,
    key: &'static str,
}

fn hint(version: Version, target: Target) -> KeyHint {
    let key: ResponseKey = version.expected_key(target);
    KeyHint {
        color: version.button_color(key),
        key: key.label(),
    }
}

impl Page {
    pub fn text(&self, config: &ExperimentConfig) -> String {
        let tri = hint(config.version, Target::Triangle);
        let dia = hint(config.version, Target::Diamond);
        let blocks = config.trials.blocks;

        match self {
            Page::Welcome => "Thank you for taking part in this study.\n\n\
                Your task is to respond as quickly as possible to a target object\n\
                appearing on the screen: a triangle or a diamond.\n\n\
                The next slides show what the display looks like\n\
                and explain how the session runs.\n\n\
                Press SPACE to continue."
                .to_string(),
            Page::Task => {
                let feedback = if config.show_feedback {
                    "After each response you will see whether it was correct.\n\n"
                } else {
                    ""
                };
                format!(
                    "Keep your eyes on the \"+\" sign in the centre of the screen\n\
                     for the whole session.\n\n\
                     Displays with shapes will be flashed briefly.\n\n\
                     Your task:\n\n\
                     - press the {} button ({}) when you notice a triangle\n\n\
                     - press the {} button ({}) when you notice a diamond\n\n\
                     Respond as quickly and as accurately as you can.\n\n\
                     {feedback}Press SPACE to continue.",
                    tri.color, tri.key, dia.color, dia.key
                )
            }
            Page::TrainingIntro => format!(
                "The study is divided into {blocks} parts,\n\
                 with a short break after each of them.\n\n\
                 Remember: press {} when you notice a triangle\n\
                 and {} when you notice a diamond.\n\n\
                 You will start with a practice session.\n\n\
                 Press SPACE to start practice.",
                tri.color, dia.color
            ),
            Page::ExperimentIntro => format!(
                "End of practice!\n\n\
                 The main experiment starts now.\n\
                 It consists of {blocks} blocks of {} trials each.\n\
                 You can rest between blocks.\n\n\
                 Remember:\n\
                 - {} button ({}) = TRIANGLE\n\
                 - {} button ({}) = DIAMOND\n\n\
                 Press SPACE to start the experiment.",
                config.trials_per_block(),
                tri.color,
                tri.key,
                dia.color,
                dia.key
            ),
            Page::BlockIntro(b) => format!("BLOCK {b} of {blocks}\n\nPress SPACE to start"),
            Page::Break(b) => format!(
                "Break!\n\nBlock {b} of {blocks} completed.\n\n\
                 Take a short rest.\n\nPress SPACE when you are ready"
            ),
            Page::Goodbye => "End of the experiment!\n\n\
                Thank you for taking part.\n\n\
                Press SPACE to finish"
                .to_string(),
        }
    }
}
