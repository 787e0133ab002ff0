//! Example showing the branch-addressed FRQI circuit for a small gradient.
//! Prints the toggle schedule, the first gates of the circuit and checks the
//! exact outcome probabilities against sin^2(angle) / 64.

use frqi::{
    Encoding, FrqiError, Image, Simulator, check_branch_probabilities, decode_distribution,
    encoding::outcome_key,
};

fn main() -> Result<(), FrqiError> {
    println!("--- frqi Example: Branch-Addressed Encoding Circuit ---");

    // Horizontal gradient: column c has intensity 32 * c
    let pixels: Vec<u8> = (0..64).map(|i| ((i % 8) * 32) as u8).collect();
    let image = Image::new(8, 8, pixels)?;
    println!("\nOriginal image:\n{}", image);

    let encoding = Encoding::from_image(&image)?;
    let circuit = encoding.circuit();
    println!("Circuit holds {} operations on {} qubits", circuit.len(), circuit.qubits().len());

    println!("\nToggle schedule (position bits flipped before each branch):");
    for (branch, bits) in encoding.toggle_steps().iter().enumerate().take(8) {
        let names: Vec<String> = bits.iter().map(|q| q.to_string()).collect();
        println!("  branch {:>2}: [{}]", branch, names.join(", "));
    }

    // Display the opening of the circuit only, the full diagram is 134 columns wide
    let head = frqi::CircuitBuilder::new()
        .add_ops(circuit.operations().iter().take(10).cloned())
        .build();
    println!("\nFirst operations:\n{}", head);

    let distribution = Simulator::new().probabilities(circuit)?;
    check_branch_probabilities(&distribution, encoding.angles(), None)?;
    println!("Outcome probabilities match sin^2(angle) / 64 on all 64 branches.");

    for branch in [0usize, 1, 7] {
        let key = outcome_key(true, branch);
        println!("  P({}) = {:.6}", key, distribution.probability(&key));
    }

    let reconstructed = decode_distribution(&distribution)?;
    println!("\nIdeal reconstruction:\n{}", reconstructed);
    Ok(())
}
