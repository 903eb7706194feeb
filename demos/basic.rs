use bytemerge::{ErrorMode, Tokenizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let text = "hello world the sky is blue hello world";
    let vocab_size = 300;

    let mut tokenizer = Tokenizer::new();

    println!("Input text: {text}");
    let learned = tokenizer.train(text, vocab_size, true)?;
    println!("Learned {learned} merges");

    let ids = tokenizer.encode(text)?;
    println!("Encoded ids: {ids:?}");

    let decoded = tokenizer.decode_to_string(&ids, ErrorMode::Strict)?;
    println!("Decoded text: {decoded}");

    Ok(())
}
