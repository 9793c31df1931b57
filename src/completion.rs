//! # Shell Completion Module
//!
//! Generates completion scripts for `playlistrx` through clap's completion
//! system.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! playlistrx completion bash > ~/.local/share/bash-completion/completions/playlistrx
//!
//! # Generate zsh completions
//! playlistrx completion zsh > ~/.config/zsh/completions/_playlistrx
//! ```

use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Generate shell completions for the given shell to stdout
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    write_completions(gen, cmd, &mut io::stdout());
}

/// Generate shell completions into any writer
pub fn write_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Convert CLI shell enum to clap_complete shell enum
pub fn shell_to_completion_shell(shell: &Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}
