//! NodePort allocation

use crate::kubernetes::error::{K8sError, K8sResult};
use std::collections::HashSet;

/// Pick one NodePort per requested port
///
/// For the port at index `i` the search starts at `base + i` and moves up past
/// ports already used in the namespace or assigned earlier in this call.
pub fn allocate_node_ports(
    count: usize,
    used: &HashSet<i32>,
    base: i32,
    max: i32,
) -> K8sResult<Vec<i32>> {
    let mut assigned: Vec<i32> = Vec::with_capacity(count);

    for i in 0..count {
        let mut candidate = base.saturating_add(i as i32);

        while candidate <= max && (used.contains(&candidate) || assigned.contains(&candidate)) {
            candidate += 1;
        }

        if candidate > max {
            return Err(K8sError::PortRangeExhausted { base, max });
        }

        assigned.push(candidate);
    }

    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_namespace() {
        let ports = allocate_node_ports(3, &HashSet::new(), 30000, 32767).unwrap();
        assert_eq!(ports, vec![30000, 30001, 30002]);
    }

    #[test]
    fn test_skips_used_ports() {
        let used = HashSet::from([30000, 30001, 30003]);
        let ports = allocate_node_ports(2, &used, 30000, 32767).unwrap();
        assert_eq!(ports, vec![30002, 30004]);
        assert!(ports.iter().all(|p| !used.contains(p)));
    }

    #[test]
    fn test_no_duplicates_within_request() {
        let used = HashSet::from([30001]);
        let ports = allocate_node_ports(2, &used, 30000, 32767).unwrap();
        assert_eq!(ports, vec![30000, 30002]);
    }

    #[test]
    fn test_range_exhausted() {
        let used = HashSet::from([30000, 30001]);
        let err = allocate_node_ports(1, &used, 30000, 30001).unwrap_err();
        assert!(matches!(err, K8sError::PortRangeExhausted { .. }));

        assert!(allocate_node_ports(3, &HashSet::new(), 30000, 30001).is_err());
    }
}
