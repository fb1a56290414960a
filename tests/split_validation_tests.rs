//! Validation and dispatch failure behavior

use splitforge::error::{ErrorCategory, SplitForgeError};
use splitforge::split::{KernelRegistry, ProcessingUnit};
use splitforge::tensor::DType;
use splitforge::{split_host, HostTensor, TensorShape};

fn source_2x4x3() -> HostTensor {
    HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[2, 4, 3])).unwrap()
}

#[test]
fn axis_equal_to_rank_is_invalid_argument() {
    let source = source_2x4x3();
    let err = split_host(&source, 3, 2).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    assert!(matches!(
        err,
        SplitForgeError::InvalidSplitAxis { axis: 3, rank: 3 }
    ));
    assert!(err.to_string().contains('3'));
}

#[test]
fn negative_axis_is_invalid_argument() {
    let source = source_2x4x3();
    let err = split_host(&source, -1, 2).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    assert!(matches!(
        err,
        SplitForgeError::InvalidSplitAxis { axis: -1, rank: 3 }
    ));
}

#[test]
fn zero_num_split_is_invalid_argument() {
    let source = source_2x4x3();
    let err = split_host(&source, 1, 0).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    assert!(matches!(err, SplitForgeError::InvalidNumSplit(0)));
}

#[test]
fn uneven_split_is_invalid_argument_with_values() {
    let source = HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[5])).unwrap();
    let err = split_host(&source, 0, 2).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);

    let msg = err.to_string();
    assert!(msg.contains("size = 5"), "message was: {}", msg);
    assert!(msg.contains("num_split 2"), "message was: {}", msg);
}

#[test]
fn validation_failures_never_produce_outputs() {
    let source = source_2x4x3();
    for (axis, num_split) in [(3i64, 2usize), (-1, 2), (1, 0), (1, 3)] {
        let result = split_host(&source, axis, num_split);
        assert!(
            result.is_err(),
            "axis={} num_split={} should fail",
            axis,
            num_split
        );
        assert!(result.unwrap_err().is_invalid_argument());
    }
}

#[test]
fn host_registry_covers_every_dtype() {
    for dtype in DType::ALL {
        assert!(KernelRegistry::global()
            .lookup(ProcessingUnit::Host, dtype)
            .is_ok());
    }
}

#[cfg(not(feature = "rocm"))]
#[test]
fn device_dispatch_unavailable_without_rocm() {
    let err = KernelRegistry::global()
        .lookup(ProcessingUnit::Device, DType::F32)
        .unwrap_err();
    assert!(matches!(err, SplitForgeError::KernelNotRegistered(_)));
    let msg = err.to_string();
    assert!(msg.contains("device"), "message was: {}", msg);
    assert!(msg.contains("f32"), "message was: {}", msg);
}

#[test]
fn identity_split_still_validates_axis() {
    // num_split == 1 short-circuits execution, never validation.
    let source = source_2x4x3();
    let err = split_host(&source, 7, 1).unwrap_err();
    assert!(matches!(
        err,
        SplitForgeError::InvalidSplitAxis { axis: 7, rank: 3 }
    ));
}
