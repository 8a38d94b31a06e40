use simd_tensor::simd::{F32x8, F64x4};
use simd_tensor::{
    ErrorKind, Tensor, TensorError, matmul_transposed, multiply, reduce_min, reduce_sum, select,
    tensor, transpose,
};

#[test]
fn test_vector_select_and_reduce() {
    let x = F32x8::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let y = F32x8::new([8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    let max = select(x.cmp_lt(&y), y, x);
    assert_eq!(max.to_array(), [8.0, 7.0, 6.0, 5.0, 5.0, 6.0, 7.0, 8.0]);

    let z = F32x8::new([1.0, -2.0, 3.0, -4.0, 5.0, -6.0, 7.0, -8.0]);
    assert_eq!(reduce_sum(&z), -4.0);
    assert_eq!(reduce_min(&z), -8.0);
}

#[test]
fn test_vector_lane_write() {
    let mut v = F64x4::splat(1.0);
    v.set(2, 9.0).unwrap();
    assert_eq!(v.get(2), Ok(9.0));
    assert_eq!(v.to_array(), [1.0, 1.0, 9.0, 1.0]);
    assert_eq!(v.get(4).unwrap_err().kind(), ErrorKind::ContractViolation);
}

#[test]
fn test_tensor_literal_round_trip() {
    let t = tensor!([1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0], [9.0]).unwrap();
    assert_eq!(t.shape(), &[3, 4]);
    assert_eq!(t.dim(-1), Ok(4));
    assert_eq!(t.dim(-2), Ok(3));
    assert_eq!(t[(0, 0)], F32x8::new([1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]));
    assert_eq!(t[(1, 0)], F32x8::new([5.0, 6.0, 7.0, 8.0, 0.0, 0.0, 0.0, 0.0]));
    assert_eq!(t[(2, 0)], F32x8::new([9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
}

#[test]
fn test_tensor_equality() {
    let a = Tensor::<f32>::from_rows(&[[1.0; 16], [2.0; 16]]).unwrap();
    let mut b = a.clone();
    assert_eq!(a, b);
    *b.block_mut(1, 8).unwrap() = F32x8::splat(2.5);
    assert_ne!(a, b);
}

#[test]
fn test_multiply() {
    let a = tensor!([1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]).unwrap();
    let b = tensor!([1.0f32, 2.0], [1.0, 2.0], [1.0, 2.0]).unwrap();
    let c = multiply(&a, &b).unwrap();
    let want = tensor!([6.0f32, 12.0], [15.0, 30.0]).unwrap();
    assert_eq!(c, want);
}

#[test]
fn test_matmul_transposed() {
    let a = Tensor::from_block_rows(&[
        [F32x8::splat(1.0), F32x8::splat(2.0), F32x8::splat(3.0)],
        [F32x8::splat(4.0), F32x8::splat(5.0), F32x8::splat(6.0)],
    ])
    .unwrap();
    let bt = Tensor::from_block_rows(&[[F32x8::splat(2.0); 3]; 8]).unwrap();
    let c = matmul_transposed(&a, &bt).unwrap();
    assert_eq!(c.to_rows(), vec![vec![96.0; 8], vec![240.0; 8]]);
}

#[test]
fn test_transpose_involution() {
    let t = tensor!([1.0, 2.0, 3.0], [4.0, 5.0], [6.0], [7.0, 8.0, 9.0]).unwrap();
    let tt = transpose(&t).unwrap();
    assert_eq!(tt.shape(), &[3, 4]);
    assert_eq!(tt.get(0, 3), Ok(7.0));
    assert_eq!(tt.get(2, 1), Ok(0.0));
    assert_eq!(transpose(&tt).unwrap(), t);
}

#[test]
fn test_transpose_two_by_sixteen() {
    let data: Vec<f32> = (1..=32).map(|v| v as f32).collect();
    let t = Tensor::<f32>::from_data([2, 16], &data).unwrap();
    let tt = transpose(&t).unwrap();
    assert_eq!(tt.shape(), &[16, 2]);
    assert_eq!(tt[(0, 0)], F32x8::new([1.0, 17.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
    assert_eq!(tt[(15, 0)], F32x8::new([16.0, 32.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
    assert_eq!(transpose(&tt).unwrap(), t);
}

#[test]
fn test_dimension_mismatch_reports_shapes() {
    let a = Tensor::<f64>::zeros([2, 3]).unwrap();
    let b = Tensor::<f64>::zeros([4, 5]).unwrap();
    match multiply(&a, &b) {
        Err(TensorError::DimensionMismatch { op, shapes }) => {
            assert_eq!(op, "multiply");
            assert_eq!(shapes, vec![vec![2, 3], vec![4, 5]]);
        }
        other => panic!("expected a dimension mismatch, got {other:?}"),
    }
    let err = matmul_transposed(&a, &b).unwrap_err();
    assert_eq!(err.to_string(), "dimension mismatch in `matmul_transposed`: shapes [[2, 3], [4, 5]]");
}

#[test]
fn test_construction_size_mismatch() {
    let err = F32x8::from_slice(&[1.0, 2.0, 3.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstructionSizeMismatch);
    let err = Tensor::<f32>::from_data([2, 2], &[1.0, 2.0, 3.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstructionSizeMismatch);
}

#[test]
fn test_generic_width_tensor() {
    let a = Tensor::<i32, 2>::from_rows(&[[1, 2, 3], [4, 5, 6]]).unwrap();
    let b = Tensor::<i32, 2>::from_rows(&[[1, 0], [0, 1], [1, 1]]).unwrap();
    let c = multiply(&a, &b).unwrap();
    assert_eq!(c.to_rows(), vec![vec![4, 5], vec![10, 11]]);
    assert_eq!(c.padded_rows(), 2);
}
