pub mod agent;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod console;
pub mod llm;
pub mod models;
pub mod tools;

use agent::AdvisorAgent;
use catalog::preprocess::Preprocessor;
use cli::Args;
use config::prompt;
use llm::chat::new_client;
use log::{ error, info };
use std::error::Error;
use std::sync::Arc;
use tokio::io::BufReader;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Helper LLM Type: {}", args.helper_llm_type.as_deref().unwrap_or(&args.chat_llm_type));
    info!("Laptop Data: {}", args.laptop_data_csv.display());
    info!("Preprocessed Cache: {}", args.preprocessed_laptop_data_csv.display());
    info!("Reprocess Data: {}", args.reprocess_data);
    info!("Max History Messages: {}", args.max_history_messages);
    info!("Prompts Path: {}", args.prompts_path);
    info!("-------------------------");

    let prompts = prompt::load_prompts(&args.prompts_path)?;

    let chat_client = new_client(&args.chat_config()?)?;
    let helper_client = new_client(&args.helper_config()?)?;
    let preprocessor = Preprocessor::new(helper_client, prompts.clone());

    let catalog = catalog::initialize(&args.catalog_paths(), args.reprocess_data, &preprocessor).await;
    if !catalog.is_loaded() {
        error!("Failed to load or preprocess laptop data. Exiting.");
        println!("Sorry, the laptop catalog could not be loaded. Please check the data files and try again.");
        return Ok(());
    }

    let mut agent = AdvisorAgent::new(
        chat_client,
        Arc::new(catalog),
        &prompts,
        args.max_messages(),
        args.chat_temperature
    )?;
    let greeting = prompt::get_greeting(&prompts)?;

    console::run_console(
        &mut agent,
        &greeting,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout()
    ).await?;

    Ok(())
}
