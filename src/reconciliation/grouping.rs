use super::ReceiptCandidate;

/// Candidates that share a non-zero `variant_group_tag`.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    pub tag: u32,
    /// (position in the original candidate list, candidate)
    pub members: Vec<(usize, ReceiptCandidate)>,
}

#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub groups: Vec<CandidateGroup>,
    pub standalone: Vec<(usize, ReceiptCandidate)>,
}

/// Splits candidates into tagged groups and standalone lines.
///
/// Groups keep the order in which their tag first appears. A tag carried by
/// a single candidate does not form a group.
pub fn partition(candidates: Vec<ReceiptCandidate>) -> Partition {
    let mut groups: Vec<CandidateGroup> = Vec::new();
    let mut standalone = Vec::new();

    for (index, candidate) in candidates.into_iter().enumerate() {
        match candidate.variant_group_tag.filter(|tag| *tag != 0) {
            Some(tag) => match groups.iter_mut().find(|g| g.tag == tag) {
                Some(group) => group.members.push((index, candidate)),
                None => groups.push(CandidateGroup {
                    tag,
                    members: vec![(index, candidate)],
                }),
            },
            None => standalone.push((index, candidate)),
        }
    }

    let (groups, singletons): (Vec<_>, Vec<_>) =
        groups.into_iter().partition(|g| g.members.len() > 1);
    standalone.extend(singletons.into_iter().flat_map(|g| g.members));
    standalone.sort_by_key(|(index, _)| *index);

    Partition { groups, standalone }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate(name: &str, tag: Option<u32>) -> ReceiptCandidate {
        ReceiptCandidate {
            name: name.to_string(),
            quantity: 1,
            unit_price: dec!(10),
            category: None,
            subcategory: None,
            unit: None,
            confidence: None,
            variant_group_tag: tag,
        }
    }

    #[test]
    fn shared_tags_form_groups_in_first_seen_order() {
        let partition = partition(vec![
            candidate("Sprite 250ml", Some(2)),
            candidate("Coca Cola 250ml", Some(1)),
            candidate("Sprite 500ml", Some(2)),
            candidate("Coca Cola 500ml", Some(1)),
        ]);

        assert_eq!(partition.groups.len(), 2);
        assert_eq!(partition.groups[0].tag, 2);
        let indices: Vec<usize> = partition.groups[0].members.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(partition.standalone.is_empty());
    }

    #[test]
    fn zero_missing_and_singleton_tags_are_standalone() {
        let partition = partition(vec![
            candidate("Sugar 1kg", Some(0)),
            candidate("Salt 1kg", None),
            candidate("Tea 250g", Some(7)),
            candidate("Lays 52g", Some(3)),
            candidate("Lays 90g", Some(3)),
        ]);

        assert_eq!(partition.groups.len(), 1);
        assert_eq!(partition.groups[0].tag, 3);
        let standalone: Vec<usize> = partition.standalone.iter().map(|(i, _)| *i).collect();
        assert_eq!(standalone, vec![0, 1, 2]);
    }
}
