/// Which card is showing and how much of it is revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardViewer {
    len: usize,
    index: usize,
    pub revealed: bool,
    pub show_hint: bool,
    pub details_open: bool,
}

impl CardViewer {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            index: 0,
            revealed: false,
            show_hint: false,
            details_open: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.len
    }

    /// Returns false when already on the last card.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.go_to(self.index + 1);
        true
    }

    pub fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.go_to(self.index - 1);
        true
    }

    pub fn flip(&mut self) {
        self.revealed = !self.revealed;
    }

    pub fn toggle_hint(&mut self) {
        self.show_hint = !self.show_hint;
    }

    pub fn toggle_details(&mut self) {
        self.details_open = !self.details_open;
    }

    // every card starts face down with everything folded away
    fn go_to(&mut self, index: usize) {
        self.index = index;
        self.revealed = false;
        self.show_hint = false;
        self.details_open = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Flip,
    Hint,
    Details,
    Reload,
    Quit,
}

const COMMAND_WORDS: &[(&str, Command)] = &[
    ("next", Command::Next),
    ("prev", Command::Prev),
    ("previous", Command::Prev),
    ("back", Command::Prev),
    ("flip", Command::Flip),
    ("reveal", Command::Flip),
    ("hint", Command::Hint),
    ("details", Command::Details),
    ("reload", Command::Reload),
    ("quit", Command::Quit),
    ("exit", Command::Quit),
];

impl Command {
    pub fn parse(input: &str) -> Option<Command> {
        let input = input.trim().to_lowercase();
        let command = match &input[..] {
            "" | "f" | "flip" | "reveal" => Command::Flip,
            "n" | "next" | ">" => Command::Next,
            "p" | "prev" | "previous" | "back" | "<" => Command::Prev,
            "h" | "hint" => Command::Hint,
            "d" | "details" => Command::Details,
            "r" | "reload" | "retry" => Command::Reload,
            "q" | "quit" | "exit" | "e" | "l" | "leave" => Command::Quit,
            other => return fuzzy_command(other),
        };
        Some(command)
    }
}

/// Accepts typos when one command word is clearly the closest.
fn fuzzy_command(input: &str) -> Option<Command> {
    let mut scored = COMMAND_WORDS
        .iter()
        .map(|(word, command)| (*command, strsim::jaro(word, input)))
        .collect::<Vec<(Command, f64)>>();
    // most similar at the start
    scored.sort_unstable_by(|(_, a), (_, b)| b.total_cmp(a));
    let (best, best_score) = scored[0];
    let runner_up = scored
        .iter()
        .find(|(command, _)| *command != best)
        .map(|(_, score)| *score)
        .unwrap_or(0.0);
    let difference = best_score - runner_up;
    if (best_score > 0.9 && difference > 0.25) || best_score == 1.0 {
        Some(best)
    } else {
        None
    }
}
