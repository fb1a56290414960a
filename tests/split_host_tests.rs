//! Host-path split behavior: fast paths, strided copy, degenerate shapes

use rand::Rng;

use splitforge::tensor::DType;
use splitforge::{split_host, HostTensor, TensorShape};

#[test]
fn identity_split_shares_source_storage() {
    let source = HostTensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();

    let outputs = split_host(&source, 1, 1).unwrap();
    assert_eq!(outputs.len(), 1);
    let out = &outputs[0];

    // Reference-identical: same storage, same offset, same shape.
    assert!(out.shares_storage(&source));
    assert_eq!(out.byte_offset(), source.byte_offset());
    assert_eq!(out.shape(), source.shape());
}

#[test]
fn leading_axis_split_aliases_aligned_source() {
    // (8, 3) split into 4 along dim 0 -> four (2, 3) views.
    let data: Vec<f32> = (0..24).map(|v| v as f32).collect();
    let source = HostTensor::from_slice(&data, &[8, 3]).unwrap();
    assert!(source.is_aligned());

    let outputs = split_host(&source, 0, 4).unwrap();
    assert_eq!(outputs.len(), 4);

    for (i, out) in outputs.iter().enumerate() {
        assert_eq!(out.shape().dims(), &[2, 3]);
        assert!(out.shares_storage(&source), "output {} must alias", i);
        assert_eq!(out.as_slice::<f32>().unwrap(), &data[i * 6..(i + 1) * 6]);
    }
}

#[test]
fn mutating_source_is_visible_through_aliased_outputs() {
    let data: Vec<f32> = (0..24).map(|v| v as f32).collect();
    let source = HostTensor::from_slice(&data, &[8, 3]).unwrap();
    let outputs = split_host(&source, 0, 4).unwrap();

    let mut updated = data.clone();
    updated[6] = 1234.5; // first element of slab 1
    source.copy_from_slice(&updated).unwrap();

    assert_eq!(outputs[1].as_slice::<f32>().unwrap()[0], 1234.5);
}

#[test]
fn leading_axis_views_concatenate_back_to_source_bytes() {
    let mut rng = rand::thread_rng();
    let data: Vec<f32> = (0..90).map(|_| rng.gen::<f32>()).collect();
    let source = HostTensor::from_slice(&data, &[6, 15]).unwrap();

    let outputs = split_host(&source, 0, 3).unwrap();

    let mut concatenated = Vec::new();
    for out in &outputs {
        concatenated.extend_from_slice(out.as_bytes());
    }
    assert_eq!(concatenated, source.as_bytes());
}

#[test]
fn generic_split_copies_correct_elements() {
    // (2, 4, 3) split along axis 1 into halves: output k element (p, s', q)
    // equals source element (p, k*2 + s', q).
    let data: Vec<f32> = (0..24).map(|v| v as f32).collect();
    let source = HostTensor::from_slice(&data, &[2, 4, 3]).unwrap();

    let outputs = split_host(&source, 1, 2).unwrap();
    assert_eq!(outputs.len(), 2);

    for (k, out) in outputs.iter().enumerate() {
        assert_eq!(out.shape().dims(), &[2, 2, 3]);
        assert!(!out.shares_storage(&source));

        let out_data = out.as_slice::<f32>().unwrap();
        for p in 0..2 {
            for s_local in 0..2 {
                for q in 0..3 {
                    let s = k * 2 + s_local;
                    let expected = data[p * 12 + s * 3 + q];
                    let actual = out_data[p * 6 + s_local * 3 + q];
                    assert_eq!(
                        actual, expected,
                        "mismatch at output {} position ({}, {}, {})",
                        k, p, s_local, q
                    );
                }
            }
        }
    }
}

#[test]
fn outputs_concatenated_reconstruct_source_shape() {
    let source = HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[4, 6, 5])).unwrap();

    for (axis, num_split) in [(0i64, 2usize), (1, 3), (2, 5)] {
        let outputs = split_host(&source, axis, num_split).unwrap();
        assert_eq!(outputs.len(), num_split);

        let mut reconstructed = source.shape().dims().to_vec();
        reconstructed[axis as usize] = 0;
        for out in &outputs {
            assert_eq!(
                out.shape().dim(axis as usize),
                source.shape().dim(axis as usize) / num_split
            );
            reconstructed[axis as usize] += out.shape().dim(axis as usize);
        }
        assert_eq!(reconstructed, source.shape().dims());
    }
}

#[test]
fn zero_size_source_yields_empty_outputs() {
    // Middle axis zero: generic path, degenerate copy.
    let source = HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[2, 0, 3])).unwrap();
    let outputs = split_host(&source, 2, 3).unwrap();
    assert_eq!(outputs.len(), 3);
    for out in &outputs {
        assert_eq!(out.shape().dims(), &[2, 0, 1]);
        assert!(out.is_empty());
    }

    // Empty leading axis splits into empty slabs.
    let source = HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[0, 6])).unwrap();
    let outputs = split_host(&source, 0, 3).unwrap();
    assert_eq!(outputs.len(), 3);
    for out in &outputs {
        assert_eq!(out.shape().dims(), &[0, 6]);
        assert!(out.is_empty());
    }
}

#[test]
fn unaligned_view_falls_through_to_copy() {
    // (4, 3) f32: slabs are 24 bytes, so the second aliased view sits at an
    // unaligned address.
    let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let source = HostTensor::from_slice(&data, &[4, 3]).unwrap();

    let views = split_host(&source, 0, 2).unwrap();
    assert!(views[0].is_aligned());
    assert!(!views[1].is_aligned());

    // Splitting the unaligned view along dim 0 must copy, not alias.
    let outputs = split_host(&views[1], 0, 2).unwrap();
    for out in &outputs {
        assert!(!out.shares_storage(&source));
        assert!(out.is_aligned());
    }
    assert_eq!(outputs[0].as_slice::<f32>().unwrap(), &data[6..9]);
    assert_eq!(outputs[1].as_slice::<f32>().unwrap(), &data[9..12]);
}

#[test]
fn split_supports_non_float_dtypes() {
    // i64 along an inner axis: generic copy path.
    let data: Vec<i64> = (0..8).collect();
    let source = HostTensor::from_slice(&data, &[2, 4]).unwrap();
    let outputs = split_host(&source, 1, 2).unwrap();
    assert_eq!(outputs[0].as_slice::<i64>().unwrap(), &[0, 1, 4, 5]);
    assert_eq!(outputs[1].as_slice::<i64>().unwrap(), &[2, 3, 6, 7]);

    // u8 along the leading axis.
    let data: Vec<u8> = (0..64).collect();
    let source = HostTensor::from_slice(&data, &[4, 16]).unwrap();
    let outputs = split_host(&source, 0, 2).unwrap();
    assert_eq!(outputs[1].as_slice::<u8>().unwrap(), &data[32..]);

    // bool along an inner axis.
    let data = [true, false, true, true, false, false];
    let source = HostTensor::from_slice(&data, &[2, 3]).unwrap();
    let outputs = split_host(&source, 1, 3).unwrap();
    assert_eq!(outputs[0].as_slice::<bool>().unwrap(), &[true, true]);
    assert_eq!(outputs[2].as_slice::<bool>().unwrap(), &[true, false]);

    // f16 along an inner axis.
    let data: Vec<half::f16> = (0..8).map(|v| half::f16::from_f32(v as f32)).collect();
    let source = HostTensor::from_slice(&data, &[2, 4]).unwrap();
    let outputs = split_host(&source, 1, 4).unwrap();
    assert_eq!(
        outputs[3].as_slice::<half::f16>().unwrap(),
        &[half::f16::from_f32(3.0), half::f16::from_f32(7.0)]
    );
}

#[test]
fn large_split_matches_scalar_reference() {
    // Exercise the rayon path with a shape big enough to spread across
    // threads, and cross-check against naive indexing.
    let mut rng = rand::thread_rng();
    let (prefix, axis, suffix) = (16usize, 12usize, 33usize);
    let data: Vec<f32> = (0..prefix * axis * suffix)
        .map(|_| rng.gen::<f32>())
        .collect();
    let source = HostTensor::from_slice(&data, &[prefix, axis, suffix]).unwrap();

    let num_split = 4;
    let delta = axis / num_split;
    let outputs = split_host(&source, 1, num_split).unwrap();

    for (k, out) in outputs.iter().enumerate() {
        let out_data = out.as_slice::<f32>().unwrap();
        for p in 0..prefix {
            for s_local in 0..delta {
                for q in 0..suffix {
                    let expected = data[(p * axis + k * delta + s_local) * suffix + q];
                    let actual = out_data[(p * delta + s_local) * suffix + q];
                    assert_eq!(actual, expected);
                }
            }
        }
    }
}
