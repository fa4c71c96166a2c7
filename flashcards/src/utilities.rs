use std::io::{self, Write};

pub fn input(prompt: &str) -> io::Result<String> {
    let mut line = String::new();
    print!("{prompt}");
    io::stdout().flush()?;
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

/// Asks a yes/no question until the answer is understood. A blank answer picks
/// `default`; end of input counts as no.
pub fn confirm(prompt: &str, default: bool) -> io::Result<bool> {
    loop {
        let answer = input(prompt)?;
        if answer.is_empty() {
            return Ok(false);
        }
        if answer.trim().is_empty() {
            return Ok(default);
        }
        if let Some(answer) = parse_yes_no(&answer) {
            return Ok(answer);
        }
        println!("Please answer yes or no.");
    }
}

pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match &answer.trim().to_ascii_lowercase()[..] {
        "y" | "yes" | "yeah" | "yea" | "true" | "on" => Some(true),
        "n" | "no" | "nope" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn understands_common_answers() {
        assert_eq!(parse_yes_no(" Yes\n"), Some(true));
        assert_eq!(parse_yes_no("nope"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
    }
}
