use crate::catalog::Catalog;
use crate::error::{AppError, Result};
use crate::model::{MediaKind, QualityTier, RawFormat};
use crate::reconcile::{AvailabilityTable, AvailabilityTables};
use std::fmt::Display;
use std::io::{BufRead, Write};

/// Interactive questions asked on a terminal (or any line-based input).
///
/// Every selection is a bounded loop: an invalid answer is reported and the
/// question is asked again, up to `max_attempts` times.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    max_attempts: usize,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, max_attempts: usize) -> Self {
        Self {
            input,
            output,
            max_attempts: max_attempts.max(1),
        }
    }

    fn read_answer(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(AppError::Prompt("input closed".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Shows `options` numbered from 1 and returns the index of the chosen one.
    pub fn select<T: Display>(&mut self, message: &str, options: &[T]) -> Result<usize> {
        if options.is_empty() {
            return Err(AppError::Prompt(format!("no options for '{}'", message)));
        }

        for _ in 0..self.max_attempts {
            writeln!(self.output, "{}", message)?;
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, option)?;
            }
            write!(self.output, "Enter the number of your choice: ")?;
            self.output.flush()?;

            let answer = self.read_answer()?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(self.output, "Invalid choice. Please try again.")?,
            }
        }

        Err(AppError::Prompt(format!(
            "no valid choice after {} attempts",
            self.max_attempts
        )))
    }

    /// Free-text question; an empty answer takes `default`.
    pub fn input(&mut self, message: &str, default: &str) -> Result<String> {
        write!(self.output, "{} [{}]: ", message, default)?;
        self.output.flush()?;

        let answer = self.read_answer()?;
        if answer.is_empty() {
            return Ok(default.to_string());
        }
        Ok(answer)
    }
}

/// Asks for a media kind among those with at least one offered tier.
///
/// Returns `None` when no kind has anything to offer. A single candidate is
/// chosen without asking.
pub fn choose_media_kind<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    tables: &AvailabilityTables,
) -> Result<Option<MediaKind>> {
    let kinds: Vec<MediaKind> = MediaKind::ALL
        .into_iter()
        .filter(|&kind| !tables.get(kind).is_empty())
        .collect();

    match kinds.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        _ => {
            let index = prompter.select("Choose the media type:", &kinds)?;
            Ok(Some(kinds[index]))
        }
    }
}

/// Asks for one of the offered tiers, highest quality first.
pub fn choose_tier<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    table: &AvailabilityTable,
) -> Result<QualityTier> {
    let tiers = table.offered_tiers();
    let labels: Vec<String> = tiers.iter().map(|&tier| table.kind().tier_label(tier)).collect();
    let index = prompter.select("Choose the desired quality:", &labels)?;
    Ok(tiers[index])
}

/// Asks for an extension offered at `tier`, showing how many videos offer each.
pub fn choose_extension<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    table: &AvailabilityTable,
    tier: QualityTier,
) -> Result<String> {
    let extensions = table.extensions(tier);
    let labels: Vec<String> = extensions
        .iter()
        .map(|ext| {
            format!(
                "{} ({}/{} videos)",
                ext.to_uppercase(),
                table.coverage(tier, ext),
                table.videos()
            )
        })
        .collect();
    let index = prompter.select("Choose the format:", &labels)?;
    Ok(extensions[index].to_string())
}

/// Asks for one concrete format of a single video: audio-only first, then video.
pub fn choose_format<'a, R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    catalog: &'a Catalog,
) -> Result<&'a RawFormat> {
    let formats: Vec<&RawFormat> = catalog
        .audio_formats
        .iter()
        .chain(&catalog.video_formats)
        .collect();
    let titles: Vec<String> = formats.iter().map(|format| format.title()).collect();
    let index = prompter.select("Choose the format:", &titles)?;
    Ok(formats[index])
}
