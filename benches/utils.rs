#![allow(dead_code)]

use rand::Rng;
use scratch_kernels::f16;

/// Elementwise 算子的读写字节数 (in + out)
pub fn elementwise_rw_bytes(n: usize, elem_bytes: usize) -> u64 {
    2 * (n * elem_bytes) as u64
}

/// 2D 传输实际搬运的字节数 (只计有效数据)
pub fn transfer_bytes(size: usize, segments: usize) -> u64 {
    (size * segments * std::mem::size_of::<f32>()) as u64
}

/// 生成随机 f32 向量 [-1.0, 1.0)
pub fn random_f32_vec(n: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// 生成随机正数 f32 向量 (倒数/对数的合法输入域)
pub fn random_positive_vec(n: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen_range(0.01..100.0)).collect()
}

/// 生成随机 f16 向量 [-1.0, 1.0)
pub fn random_f16_vec(n: usize) -> Vec<f16> {
    random_f32_vec(n).into_iter().map(f16::from_f32).collect()
}
