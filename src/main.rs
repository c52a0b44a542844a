use flux_kontext::{
    AspectRatio, ChatMessage, FluxConfig, FluxKontextClient, GenerationRequest, ImageClient,
    OutputFormat,
};
use std::fs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    flux_kontext::logger::init_with_config(
        flux_kontext::logger::LoggerConfig::development()
            .with_level(flux_kontext::logger::LogLevel::Debug),
    )?;

    let config = FluxConfig::from_env();
    flux_kontext::logger::log_config_info(&config);

    if !config.is_api_key_set() {
        log::error!("❌ {}", FluxConfig::api_key_help());
        return Err("missing API key".into());
    }

    log::info!("🔄 Creating Flux-Kontext client...");
    let client = match FluxKontextClient::new(config) {
        Ok(client) => {
            log::info!("✅ Client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize client: {}", e);
            return Err(e.into());
        }
    };

    log::info!("🖼️  Available models:");
    for (id, name, provider) in ImageClient::supported_models() {
        log::info!("  {} - {} ({})", id, name, provider);
    }

    // Test 1: Single text-to-image generation
    log::info!("🎨 Testing single image generation...");

    let request = GenerationRequest::new(
        "A serene landscape with mountains and a lake at sunset, digital art style",
    )
    .with_aspect_ratio(AspectRatio::Wide)
    .with_output_format(OutputFormat::Png)
    .with_safety_tolerance(2);

    let timer = flux_kontext::logger::timer("single generation");
    match client.image().generate(&request).await {
        Ok(image) => {
            log::info!("✅ Image generation successful!");
            log::info!("🔗 Image URL: {}", image.url);
            log::info!("📏 Image size: {} bytes", image.bytes.len());

            let filename = format!("generated_image_{}.png", chrono::Utc::now().timestamp());
            match fs::write(&filename, &image.bytes) {
                Ok(_) => log::info!("💾 Image saved to: {}", filename),
                Err(e) => log::error!("❌ Failed to save image: {}", e),
            }
        }
        Err(e) => {
            log::error!("❌ Image generation failed: {}", e);
        }
    }
    timer.stop();

    // Test 2: Chat-style generation
    log::info!("💬 Testing chat-style generation...");

    let messages = vec![ChatMessage::user("Draw a robot learning to paint")];
    match client.image().generate_chat(&messages).await {
        Ok(url) => {
            log::info!("✅ Chat generation successful!");
            log::info!("🔗 Image URL: {}", url);
        }
        Err(e) => {
            log::error!("❌ Chat generation failed: {}", e);
        }
    }

    // Test 3: Batch generation with a fixed seed
    log::info!("📦 Testing batch generation...");

    let template = GenerationRequest::new("A watercolor fox in four variations").with_seed(10);
    match client.batch().run(&template, 4).await {
        Ok(summary) => {
            log::info!("✅ Batch completed: {}", summary.status_line());
            for image in &summary.images {
                let filename = format!("batch_seed_{}.jpeg", image.seed);
                match fs::write(&filename, &image.bytes) {
                    Ok(_) => log::info!("💾 Saved {} ({} bytes)", filename, image.bytes.len()),
                    Err(e) => log::error!("❌ Failed to save {}: {}", filename, e),
                }
            }
            for failure in &summary.failures {
                log::warn!("⚠️  Seed {} failed: {}", failure.seed, failure.message);
            }
        }
        Err(e) => {
            log::error!("❌ Batch failed entirely: {}", e);
        }
    }

    log::info!("🎉 All tests completed!");

    Ok(())
}
