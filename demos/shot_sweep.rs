//! Example sweeping shot counts for one image and printing every metric.
//! Reconstruction error should shrink as the number of shots grows.

use frqi::{
    FrqiError, Image, MetricKind, ShotSchedule, Simulator, evaluate_image, image_entropy,
};

fn main() -> Result<(), FrqiError> {
    println!("--- frqi Example: Fidelity vs. Shots ---");

    // A diagonal ramp with a bright square in the middle
    let pixels: Vec<u8> = (0..64)
        .map(|i| {
            let (r, c) = (i / 8, i % 8);
            if (2..6).contains(&r) && (2..6).contains(&c) { 240 } else { ((r + c) * 16) as u8 }
        })
        .collect();
    let image = Image::new(8, 8, pixels)?;
    println!("\nOriginal image (entropy {:.3} bits):\n{}", image_entropy(&image), image);

    let simulator = Simulator::seeded(2024);
    let shots: Vec<u64> = ShotSchedule::linear(500, 5000, 1500).counts();

    print!("{:>8}", "shots");
    for kind in MetricKind::ALL {
        print!("{:>14}", kind.name());
    }
    println!();

    let per_metric = MetricKind::ALL
        .iter()
        .map(|&kind| evaluate_image(0, &image, &simulator, kind, &shots))
        .collect::<Result<Vec<_>, _>>()?;

    for (i, count) in shots.iter().enumerate() {
        print!("{:>8}", count);
        for evaluation in &per_metric {
            print!("{:>14.6}", evaluation.scores[i]);
        }
        println!();
    }

    println!("\nFull single-image schedule: {} shot counts", ShotSchedule::SINGLE_IMAGE.counts().len());
    Ok(())
}
