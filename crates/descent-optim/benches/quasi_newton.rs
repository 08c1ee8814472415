//! Quasi-Newton solver benchmarks.
//!
//! Compares BFGS and L-BFGS on the extended Rosenbrock function across
//! problem sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use descent_core::objective::CostFunction;
use descent_core::types::DVector;
use descent_core::Result;
use descent_optim::{minimize, Bfgs, Lbfgs, Settings};

struct Rosenbrock;

impl CostFunction<f64> for Rosenbrock {
    fn cost(&self, x: &DVector<f64>) -> Result<f64> {
        let mut sum = 0.0;
        for i in 0..x.len() - 1 {
            let a = 1.0 - x[i];
            let b = x[i + 1] - x[i] * x[i];
            sum += a * a + 100.0 * b * b;
        }
        Ok(sum)
    }

    fn cost_and_gradient(&self, x: &DVector<f64>, grad: &mut DVector<f64>) -> Result<f64> {
        grad.fill(0.0);
        for i in 0..x.len() - 1 {
            let t = x[i + 1] - x[i] * x[i];
            grad[i] += -2.0 * (1.0 - x[i]) - 400.0 * t * x[i];
            grad[i + 1] += 200.0 * t;
        }
        self.cost(x)
    }
}

fn start_point(n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| if i % 2 == 0 { -1.2 } else { 1.0 })
}

fn bench_rosenbrock(c: &mut Criterion) {
    let mut group = c.benchmark_group("rosenbrock");
    for &n in &[2usize, 10, 50] {
        let init = start_point(n);
        let settings = Settings::default();

        group.bench_with_input(BenchmarkId::new("bfgs", n), &n, |b, _| {
            b.iter(|| {
                let mut solver = Bfgs::new();
                minimize(&Rosenbrock, black_box(&init), &settings, &mut solver)
            });
        });
        group.bench_with_input(BenchmarkId::new("lbfgs", n), &n, |b, _| {
            b.iter(|| {
                let mut solver = Lbfgs::new();
                minimize(&Rosenbrock, black_box(&init), &settings, &mut solver)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rosenbrock);
criterion_main!(benches);
