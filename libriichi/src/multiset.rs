//! Multiset helpers over sorted copies. Zones are small (tens of tiles), so
//! sorting per call is fine.

/// Elements of `lhs` not matched by an element of `rhs`, with multiplicity,
/// in ascending order.
pub(crate) fn difference<T: Ord + Clone>(lhs: &[T], rhs: &[T]) -> Vec<T> {
    let mut l = lhs.to_vec();
    let mut r = rhs.to_vec();
    l.sort_unstable();
    r.sort_unstable();

    let mut ret = vec![];
    let mut ri = 0;
    for item in l {
        while ri < r.len() && r[ri] < item {
            ri += 1;
        }
        if ri < r.len() && r[ri] == item {
            ri += 1;
        } else {
            ret.push(item);
        }
    }
    ret
}

pub(crate) fn same<T: Ord + Clone>(lhs: &[T], rhs: &[T]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    let mut l = lhs.to_vec();
    let mut r = rhs.to_vec();
    l.sort_unstable();
    r.sort_unstable();
    l == r
}

pub(crate) fn is_subset<T: Ord + Clone>(sub: &[T], sup: &[T]) -> bool {
    difference(sub, sup).is_empty()
}

pub(crate) fn count<T: PartialEq>(items: &[T], needle: &T) -> usize {
    items.iter().filter(|&x| x == needle).count()
}
