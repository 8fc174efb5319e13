// Species Counterpoint Analyzer: CLI entry point.
//
// Loads a composition (built-in exercise, JSON exercise file or MIDI file),
// validates it, checks it against the rules of the requested species and
// prints every violation. Can also write the composition back out as MIDI,
// LilyPond or an engraved PNG.
//
// Usage:
//   cargo run -p species_counterpoint -- (-t NAME | -j FILE | -r FILE)
//     [-s SPECIES] [-c CONFIG] [-w OUT.mid] [-l OUT.ly] [-p OUT.png]
//   cargo run -p species_counterpoint -- -z FILE.mid [-w OUT.mid] [-l OUT.ly] [-p OUT.png]
//
// Long forms: --builtin, --read-json, --read-midi, --species, --config,
// --write-midi, --write-ly, --write-png, --typeset.
//
// Exit status: 0 after a completed analysis (violations are not failures),
// 1 when the input is invalid, 2 on usage errors.
//
// Logging goes to stderr through env_logger; set RUST_LOG=info or debug for
// per-rule detail.

use species_counterpoint::composition::{Composition, validate};
use species_counterpoint::config::AnalysisConfig;
use species_counterpoint::error::{ExerciseError, ValidationError};
use species_counterpoint::exercise::{BUILTINS, ExerciseFile, builtin};
use species_counterpoint::lilypond::{render_png, write_lilypond};
use species_counterpoint::midi::{note_counts, read_midi_file, write_midi_file};
use species_counterpoint::species::Species;
use species_counterpoint::standardize::{cantus_line, render_report};
use std::path::{Path, PathBuf};

/// Flags that take a value, as (short, long).
const FLAGS: [(&str, &str); 9] = [
    ("-t", "--builtin"),
    ("-j", "--read-json"),
    ("-r", "--read-midi"),
    ("-s", "--species"),
    ("-c", "--config"),
    ("-w", "--write-midi"),
    ("-l", "--write-ly"),
    ("-p", "--write-png"),
    ("-z", "--typeset"),
];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return;
    }
    check_args(&args);

    let builtin_name = flag_value(&args, "-t");
    let json_path = flag_value(&args, "-j");
    let midi_path = flag_value(&args, "-r");
    let typeset_path = flag_value(&args, "-z");

    if let Some(path) = typeset_path {
        if builtin_name.is_some() || json_path.is_some() || midi_path.is_some() {
            usage_error("--typeset cannot be combined with another input");
        }
        typeset(&args, Path::new(path));
        return;
    }

    let sources = [builtin_name, json_path, midi_path].iter().flatten().count();
    if sources != 1 {
        usage_error("exactly one of --builtin, --read-json or --read-midi is required");
    }

    println!("=== Species Counterpoint Analyzer ===");

    // Load the composition
    let (composition, exercise_species, mut problems) = if let Some(name) = builtin_name {
        println!("Input: built-in exercise '{}'", name);
        load_exercise(builtin(name))
    } else if let Some(path) = json_path {
        println!("Input: {}", path);
        load_exercise(ExerciseFile::load(Path::new(path)))
    } else if let Some(path) = midi_path {
        println!("Input: {}", path);
        match read_midi_file(Path::new(path)) {
            Ok((composition, problems)) => (Some(composition), None, problems),
            Err(e) => fail(&format!("Error reading MIDI: {}", e)),
        }
    } else {
        usage_error("no input given")
    };

    // Species: flag, then the exercise's own, then first species
    let species_number = match flag_value(&args, "-s") {
        Some(value) => match value.parse::<u8>() {
            Ok(n) => n,
            Err(_) => usage_error(&format!("species must be a number, got '{}'", value)),
        },
        None => exercise_species.unwrap_or(1),
    };
    let species = match Species::try_from(species_number) {
        Ok(species) => Some(species),
        Err(e) => {
            problems.push(e);
            None
        }
    };

    // Tier-1 validation
    if let Some(composition) = &composition {
        problems.extend(validate(composition));
    }
    let (composition, species) = match (composition, species) {
        (Some(composition), Some(species)) if problems.is_empty() => (composition, species),
        _ => {
            report_problems(&problems);
            std::process::exit(1);
        }
    };

    let config = match flag_value(&args, "-c") {
        Some(path) => AnalysisConfig::load_or_default(Path::new(path)),
        None => AnalysisConfig::default(),
    };

    if let Some(title) = &composition.title {
        println!("Title: {}", title);
    }
    println!("Key: {}", composition.key);
    println!("Meter: {}", composition.meter);
    println!("Species: {}", species);
    println!();

    write_outputs(&args, &composition);

    // Analysis
    let report = match species_counterpoint::analyze(&composition, species, &config) {
        Ok(report) => report,
        Err(e) => fail(&format!("Error: {}", e)),
    };

    if let Some(line) = cantus_line(&report) {
        println!("{}", line);
    }

    for line in render_report(&report, composition.meter, config.show_rule_text) {
        println!("{}", line);
    }
    println!();
    println!(
        "{} rule(s) checked, {} violation(s)",
        report.len(),
        report.violation_count()
    );
}

/// Read a MIDI file and only write it back out in the requested formats.
fn typeset(args: &[String], path: &Path) {
    let composition = match read_midi_file(path) {
        Ok((composition, problems)) => {
            for problem in &problems {
                eprintln!("Warning: {}", problem);
            }
            composition
        }
        Err(e) => fail(&format!("Error reading MIDI: {}", e)),
    };

    println!("Read {}", path.display());
    for (voice, count) in note_counts(&composition) {
        println!("  {}: {} note(s)", voice, count);
    }

    let wrote = write_outputs(args, &composition);
    if !wrote {
        // Default output: the same name with a .ly extension
        write_ly_or_exit(&composition, &path.with_extension("ly"));
    }
}

/// Write every requested output. Returns whether anything was requested.
fn write_outputs(args: &[String], composition: &Composition) -> bool {
    let mut wrote = false;

    if let Some(path) = flag_value(args, "-w") {
        println!("Writing MIDI to {}...", path);
        if let Err(e) = write_midi_file(composition, Path::new(path)) {
            fail(&format!("  Error writing MIDI: {}", e));
        }
        wrote = true;
    }

    if let Some(path) = flag_value(args, "-l") {
        write_ly_or_exit(composition, Path::new(path));
        wrote = true;
    }

    if let Some(path) = flag_value(args, "-p") {
        let png_path = PathBuf::from(path);
        let ly_path = match flag_value(args, "-l") {
            Some(ly) => PathBuf::from(ly),
            None => {
                let ly = png_path.with_extension("ly");
                write_ly_or_exit(composition, &ly);
                ly
            }
        };
        println!("Engraving {}...", png_path.display());
        if let Err(e) = render_png(&ly_path, &png_path) {
            fail(&format!("  Error engraving: {}", e));
        }
        wrote = true;
    }

    wrote
}

fn write_ly_or_exit(composition: &Composition, path: &Path) {
    println!("Writing LilyPond to {}...", path.display());
    if let Err(e) = write_lilypond(composition, path) {
        fail(&format!("  Error writing LilyPond: {}", e));
    }
}

/// A composition (if one could be built), its declared species, and the
/// problems found on the way.
type Loaded = (Option<Composition>, Option<u8>, Vec<ValidationError>);

fn load_exercise(file: Result<ExerciseFile, ExerciseError>) -> Loaded {
    let file = match file {
        Ok(file) => file,
        Err(ExerciseError::UnknownBuiltin(name)) => usage_error(&format!(
            "unknown built-in '{}' (choose from {})",
            name,
            BUILTINS.join(", ")
        )),
        Err(e) => fail(&format!("Error reading exercise: {}", e)),
    };
    match file.to_composition() {
        Ok(composition) => (Some(composition), file.species, Vec::new()),
        Err(ExerciseError::Invalid(problems)) => (None, file.species, problems),
        Err(e) => fail(&format!("Error reading exercise: {}", e)),
    }
}

fn report_problems(problems: &[ValidationError]) {
    eprintln!("Input is invalid ({} problem(s)):", problems.len());
    for problem in problems {
        eprintln!("  {}", problem);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn usage_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!();
    print_usage_to_stderr();
    std::process::exit(2);
}

fn usage_text() -> String {
    format!(
        "Usage: counterpoint (-t NAME | -j FILE | -r FILE) [-s SPECIES] [-c CONFIG]\n\
         \x20                   [-w OUT.mid] [-l OUT.ly] [-p OUT.png]\n\
         \x20      counterpoint -z FILE.mid [-w OUT.mid] [-l OUT.ly] [-p OUT.png]\n\
         \n\
         \x20 -t, --builtin NAME     analyze a built-in exercise ({})\n\
         \x20 -j, --read-json FILE   analyze a JSON exercise file\n\
         \x20 -r, --read-midi FILE   analyze a MIDI file\n\
         \x20 -s, --species N        species to check (1-4, default 1 or the exercise's)\n\
         \x20 -c, --config FILE      analysis settings (JSON)\n\
         \x20 -w, --write-midi FILE  write the composition as MIDI\n\
         \x20 -l, --write-ly FILE    write the composition as LilyPond\n\
         \x20 -p, --write-png FILE   engrave the composition with lilypond\n\
         \x20 -z, --typeset FILE     read MIDI and only write the outputs",
        BUILTINS.join(", ")
    )
}

fn print_usage() {
    println!("{}", usage_text());
}

fn print_usage_to_stderr() {
    eprintln!("{}", usage_text());
}

/// Reject unknown flags and flags missing their value.
fn check_args(args: &[String]) {
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if !FLAGS.iter().any(|(short, long)| arg == short || arg == long) {
            usage_error(&format!("unexpected argument '{}'", arg));
        }
        match args.get(i + 1) {
            Some(value) if !value.starts_with('-') => {}
            _ => usage_error(&format!("{} needs a value", arg)),
        }
        i += 2;
    }
}

/// Value following a flag, given by its short form or the matching long form.
fn flag_value<'a>(args: &'a [String], short: &str) -> Option<&'a str> {
    let long = FLAGS
        .iter()
        .find(|(s, _)| *s == short)
        .map(|(_, l)| *l)?;
    args.iter()
        .position(|a| a == short || a == long)
        .and_then(|i| args.get(i + 1))
        .map(|v| v.as_str())
}
