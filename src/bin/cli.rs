//! This is the command line tool that loads an input file and either compresses
//! or decompresses it.

extern crate clap;
extern crate env_logger;
extern crate log;

use clap::{value_parser, Arg, ArgAction, Command};
use fastlzlib::full::{compress_chunked, decompress_chunked, CHUNK_SIZE};
use fastlzlib::header::{is_compressed_stream, stream_block_size};
use fastlzlib::{Context, BEST_COMPRESSION, DEFAULT_BLOCK_SIZE};

use std::{fs, time::Instant};
use std::{fs::File, io::Write};

/// The extension of compressed files.
const FILE_EXTENSION: &str = ".flz";

fn save_file(data: &[u8], path: &str) {
    let mut f = File::create(path).expect("Can't create file");
    f.write_all(data).expect("Unable to write data");
    log::info!("Wrote {}.", &path);
}

/// A scoped utility struct for measuring and reporting time.
struct Timer {
    start: std::time::Instant,
}

impl Timer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let now = Instant::now();
        if let Some(duration) = now.checked_duration_since(self.start) {
            log::info!(
                "Operation completed in {:03} seconds",
                duration.as_secs_f32()
            );
        }
    }
}

fn main() {
    let matches = Command::new("CLI")
        .version(fastlzlib::VERSION)
        .arg(
            Arg::new("checked")
                .long("check")
                .help("Decompress the result and compare it to the input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("decompress")
                .short('d')
                .long("decompress")
                .help("Try to decompress the input")
                .action(ArgAction::SetTrue)
                .conflicts_with("compress"),
        )
        .arg(
            Arg::new("compress")
                .short('c')
                .long("compress")
                .help("Compress the input")
                .conflicts_with("decompress")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path of the output file")
                .num_args(1),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("LEVEL")
                .help("The zlib compression level (0-9)")
                .value_parser(value_parser!(i32))
                .num_args(1),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .value_name("BYTES")
                .help("The size of each block")
                .value_parser(value_parser!(usize))
                .num_args(1),
        )
        .arg(
            Arg::new("chunk")
                .long("chunk")
                .value_name("BYTES")
                .help("The number of bytes handed to the stream per call")
                .value_parser(value_parser!(usize))
                .num_args(1),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    env_logger::builder().format_timestamp(None).init();

    let mut cli_compress = matches.get_flag("compress");
    let cli_decompress = matches.get_flag("decompress");
    let cli_checked_mode = matches.get_flag("checked");
    let mut cli_output_path = matches.get_one::<String>("output").cloned();
    let level = matches
        .get_one::<i32>("level")
        .copied()
        .unwrap_or(BEST_COMPRESSION);
    let mut block_size = matches
        .get_one::<usize>("block-size")
        .copied()
        .unwrap_or(DEFAULT_BLOCK_SIZE);
    let chunk = matches
        .get_one::<usize>("chunk")
        .copied()
        .unwrap_or(CHUNK_SIZE);

    let input_path = matches.get_one::<String>("INPUT").unwrap();
    let input = fs::read(input_path).expect("Can't open the input file");

    // The user did not specify if this is compress of decompress. Try to figure
    // out using the content of the file.
    if !cli_compress && !cli_decompress && !is_compressed_stream(&input) {
        cli_compress = true;
    }

    // Come up with a file name.
    if cli_output_path.is_none() {
        if input_path.ends_with(FILE_EXTENSION) {
            // remove the extension.
            let end = input_path.len() - FILE_EXTENSION.len();
            cli_output_path = Some(String::from(&input_path[0..end]));
        } else if cli_compress {
            // Add the extension.
            cli_output_path = Some(input_path.clone() + FILE_EXTENSION);
        } else {
            cli_output_path = Some(input_path.clone() + ".out");
        }
    }

    let out = &cli_output_path.unwrap();
    let x = Timer::new();

    if cli_compress {
        let ctx = Context::new(level, block_size);
        log::info!(
            "Compressing with level {} and block size {}",
            ctx.level(),
            ctx.block_size()
        );
        let dest = match compress_chunked(&input, ctx, chunk, chunk) {
            Ok(dest) => dest,
            Err(err) => {
                log::error!("Compression failed: {}", err);
                return;
            }
        };
        let (from, to) = (input.len(), dest.len());
        log::info!("Compressed from {} to {} bytes.", from, to);
        log::info!("Compression ratio is {:.4}x.", from as f64 / to as f64);
        save_file(&dest, out);

        if cli_checked_mode {
            match decompress_chunked(&dest, ctx.block_size(), chunk, chunk) {
                Ok(decoded) if decoded == input => log::info!("Correct!"),
                Ok(_) => log::info!("Incorrect!"),
                Err(err) => {
                    log::info!("Could not decompress the file: {}", err)
                }
            }
        }
        return;
    }

    // Decode with the block size that the stream was written with, unless the
    // user asked for something else.
    if matches.get_one::<usize>("block-size").is_none() {
        let advertised = stream_block_size(&input) as usize;
        if advertised != 0 {
            block_size = advertised;
        }
    }

    match decompress_chunked(&input, block_size, chunk, chunk) {
        Ok(dest) => {
            log::info!(
                "Decompressed from {} to {} bytes.",
                input.len(),
                dest.len()
            );
            save_file(&dest, out);
        }
        Err(err) => log::info!("Decompression failed: {}", err),
    }

    drop(x);
}
