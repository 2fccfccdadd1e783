use batched_device::{CommandQueue, DeviceMatrix, DeviceVector};
use batched_kernel::{dot, syrk, Triangle};
use batched_view::{CompressedMatrix, DenseMatrix, DenseVector, MemoryOrder};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::hint::black_box;
use std::time::{Duration, Instant};

fn mean(durations: &[Duration]) -> Duration {
    let total_nanos: u128 = durations.iter().map(|d| d.as_nanos()).sum();
    Duration::from_nanos((total_nanos / durations.len() as u128) as u64)
}

fn bench_n(label: &str, warmup_iters: usize, iters: usize, mut f: impl FnMut()) -> Duration {
    for _ in 0..warmup_iters {
        f();
    }

    let mut samples = Vec::with_capacity(iters);
    for _ in 0..iters {
        let t0 = Instant::now();
        f();
        samples.push(t0.elapsed());
    }

    let avg = mean(&samples);
    println!("{label}: {:.3} ms", avg.as_secs_f64() * 1e3);
    avg
}

fn random_matrix(
    rng: &mut StdRng,
    rows: usize,
    cols: usize,
    order: MemoryOrder,
) -> DenseMatrix<f64> {
    DenseMatrix::from_fn(rows, cols, order, |_, _| rng.sample(StandardNormal))
}

fn random_sparse(
    rng: &mut StdRng,
    rows: usize,
    cols: usize,
    density: f64,
) -> CompressedMatrix<f64> {
    let nnz = (rows as f64 * cols as f64 * density) as usize;
    let mut m = CompressedMatrix::with_capacity(rows, cols, nnz);
    for i in 0..rows {
        for j in 0..cols {
            if rng.gen_bool(density) {
                let _ = m.insert(i, j, rng.sample(StandardNormal));
            }
        }
    }
    m
}

fn main() {
    let mut rng = StdRng::seed_from_u64(0);
    let queue = CommandQueue::new().expect("queue");

    println!("=== syrk (n = 256, k = 128) ===");
    let a = random_matrix(&mut rng, 256, 128, MemoryOrder::RowMajor);
    let a_col = random_matrix(&mut rng, 256, 128, MemoryOrder::ColMajor);
    let mut c = DenseMatrix::<f64>::new(256, 256);
    bench_n("local dense", 2, 10, || {
        syrk(&a, &mut c, 1.0, Triangle::Upper).unwrap().wait().unwrap();
        black_box(&c);
    });

    let sparse = random_sparse(&mut rng, 256, 1024, 0.02);
    bench_n("local sparse (2%)", 2, 10, || {
        syrk(&sparse, &mut c, 1.0, Triangle::Upper).unwrap().wait().unwrap();
        black_box(&c);
    });

    let a_dev = DeviceMatrix::from_host(&queue, &a);
    let a_col_dev = DeviceMatrix::from_host(&queue, &a_col);
    let mut c_dev = DeviceMatrix::zeros(&queue, 256, 256, MemoryOrder::RowMajor);
    bench_n("device, same orientation", 2, 10, || {
        syrk(&a_dev, &mut c_dev, 1.0, Triangle::Upper).unwrap().wait().unwrap();
    });
    bench_n("device, transposed", 2, 10, || {
        syrk(&a_col_dev, &mut c_dev, 1.0, Triangle::Upper).unwrap().wait().unwrap();
    });

    println!();
    println!("=== dot (n = 1 << 20) ===");
    let n = 1 << 20;
    let xs: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
    let ys: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
    let x = DenseVector::from_vec(xs.clone());
    let y = DenseVector::from_vec(ys.clone());
    bench_n("local dense", 3, 20, || {
        black_box(dot(&x, &y).unwrap());
    });

    let x_dev = DeviceVector::from_host(&queue, &xs);
    let y_dev = DeviceVector::from_host(&queue, &ys);
    bench_n("device", 3, 20, || {
        black_box(dot(&x_dev, &y_dev).unwrap());
    });
}
