use clap::{ value_parser, Arg, ArgAction, Command };
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use std::error::Error;
use std::path::PathBuf;

use anpr_rust::config::{ self, AnprConfig };
use anpr_rust::Anpr;


fn main() -> Result<(), Box<dyn Error>>{
    let matches = Command::new("anpr")
                    .version("0.1.0")
                    .author("kingrong")
                    .about("Reads the number plate of a car photo with edge detection and tesseract")
                    .arg(Arg::new("INPUT")
                        .help("image file with license plate")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1))
                    .arg(Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("TOML config file")
                        .value_parser(value_parser!(PathBuf)))
                    .arg(Arg::new("tesseract")
                        .long("tesseract")
                        .value_name("PATH")
                        .help("tesseract executable, overrides ocr.tesseract_cmd")
                        .value_parser(value_parser!(PathBuf)))
                    .arg(Arg::new("psm")
                        .long("psm")
                        .value_name("N")
                        .help("tesseract page segmentation mode, overrides ocr.psm")
                        .value_parser(value_parser!(u8)))
                    .arg(Arg::new("show")
                        .long("show")
                        .help("show the intermediate images and wait for the windows to close")
                        .action(ArgAction::SetTrue))
                    .arg(Arg::new("dump-dir")
                        .long("dump-dir")
                        .value_name("DIR")
                        .help("write the intermediate images into DIR")
                        .value_parser(value_parser!(PathBuf)))
                    .arg(Arg::new("verbose")
                        .short('v')
                        .long("verbose")
                        .help("log every pipeline stage")
                        .action(ArgAction::SetTrue))
                    .get_matches();

    let level = if matches.get_flag("verbose") { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let file_name = matches.get_one::<PathBuf>("INPUT").ok_or("image is required")?;

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => config::load_config(path)?,
        None => AnprConfig::default(),
    };
    if let Some(cmd) = matches.get_one::<PathBuf>("tesseract") {
        config.ocr.tesseract_cmd = cmd.clone();
    }
    if let Some(psm) = matches.get_one::<u8>("psm") {
        config.ocr.psm = *psm;
    }
    if matches.get_flag("show") {
        config.debug.display = true;
    }
    if let Some(dir) = matches.get_one::<PathBuf>("dump-dir") {
        config.debug.dump_dir = Some(dir.clone());
    }

    let anpr = Anpr::new(config);
    let res = anpr.recognize_path(file_name)?;
    println!("{}", res.text);

    Ok(())
}
