// crates/driftlock-rdf/src/canon.rs
//
// Deterministic graph canonicalization. Blank nodes are relabeled by
// iterated signature hashing: each blank node's signature is refined
// from the signatures of its neighborhood until stable, groups that
// remain indistinguishable are split one promotion at a time, and the
// final labels (`_:c0`, `_:c1`, ...) follow signature order. The output
// is a sorted, deduplicated list of N-Triples lines that is independent
// of the input serialization, triple order, and blank node naming.
//
// Canonical forms are equal iff the graphs are isomorphic, up to
// automorphic blank nodes (which are interchangeable and therefore
// render identically no matter which member of a group is promoted
// first).

use std::collections::{BTreeMap, HashMap};

use oxrdf::{Subject, Term, Triple};

use driftlock_core::hashing::hash_hex;

/// Canonicalize a set of triples into sorted N-Triples lines.
pub fn canonical_triples(triples: &[Triple]) -> Vec<String> {
    let labels = canonical_labels(triples);
    let mut lines: Vec<String> = triples
        .iter()
        .map(|t| render_triple(t, &labels))
        .collect();
    lines.sort();
    lines.dedup();
    lines
}

/// Canonical text of a graph: its sorted N-Triples lines joined by
/// newlines.
pub fn canonical_graph_text(triples: &[Triple]) -> String {
    canonical_triples(triples).join("\n")
}

/// Assign stable labels (`c0`, `c1`, ...) to every blank node.
fn canonical_labels(triples: &[Triple]) -> HashMap<String, String> {
    let mut signatures: BTreeMap<String, String> = BTreeMap::new();
    for triple in triples {
        if let Subject::BlankNode(b) = &triple.subject {
            signatures.insert(b.as_str().to_string(), "b".to_string());
        }
        if let Term::BlankNode(b) = &triple.object {
            signatures.insert(b.as_str().to_string(), "b".to_string());
        }
    }
    if signatures.is_empty() {
        return HashMap::new();
    }

    refine(&mut signatures, triples);

    // Split groups of indistinguishable nodes: promote one member with a
    // distinguishing mark and re-refine until every signature is unique.
    // Members of a group are automorphic under the refined signatures,
    // so the promotion order cannot change the rendered triple set.
    let max_rounds = signatures.len();
    for _ in 0..max_rounds {
        let mut by_signature: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (node, sig) in signatures.iter() {
            by_signature.entry(sig.clone()).or_default().push(node.clone());
        }
        let Some(group) = by_signature.values().find(|members| members.len() > 1) else {
            break;
        };
        let promoted = group[0].clone();
        let marked = hash_hex(format!("{}!promoted", signatures[&promoted]).as_bytes());
        signatures.insert(promoted, marked);
        refine(&mut signatures, triples);
    }

    // Label in signature order.
    let mut ordered: Vec<(String, String)> = signatures
        .into_iter()
        .map(|(node, sig)| (sig, node))
        .collect();
    ordered.sort();
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (_, node))| (node, format!("c{}", i)))
        .collect()
}

/// One pass of signature refinement to a fixpoint.
fn refine(signatures: &mut BTreeMap<String, String>, triples: &[Triple]) {
    for _ in 0..triples.len().max(1) {
        let mut next: BTreeMap<String, String> = BTreeMap::new();
        for node in signatures.keys() {
            let mut descriptors: Vec<String> = Vec::new();
            for triple in triples {
                if blank_id(&triple.subject) == Some(node.as_str()) {
                    descriptors.push(format!(
                        "s|{}|{}",
                        triple.predicate,
                        object_signature(&triple.object, signatures)
                    ));
                }
                if let Term::BlankNode(b) = &triple.object {
                    if b.as_str() == node {
                        descriptors.push(format!(
                            "o|{}|{}",
                            subject_signature(&triple.subject, signatures),
                            triple.predicate
                        ));
                    }
                }
            }
            descriptors.sort();
            let input = format!("{}#{}", signatures[node], descriptors.join(";"));
            next.insert(node.clone(), hash_hex(input.as_bytes()));
        }
        if next == *signatures {
            break;
        }
        *signatures = next;
    }
}

fn blank_id(subject: &Subject) -> Option<&str> {
    match subject {
        Subject::BlankNode(b) => Some(b.as_str()),
        _ => None,
    }
}

fn subject_signature(subject: &Subject, signatures: &BTreeMap<String, String>) -> String {
    match subject {
        Subject::NamedNode(n) => n.to_string(),
        Subject::BlankNode(b) => signatures
            .get(b.as_str())
            .cloned()
            .unwrap_or_else(|| "b".to_string()),
    }
}

fn object_signature(object: &Term, signatures: &BTreeMap<String, String>) -> String {
    match object {
        Term::NamedNode(n) => n.to_string(),
        Term::Literal(l) => l.to_string(),
        Term::BlankNode(b) => signatures
            .get(b.as_str())
            .cloned()
            .unwrap_or_else(|| "b".to_string()),
    }
}

fn render_triple(triple: &Triple, labels: &HashMap<String, String>) -> String {
    let subject = match &triple.subject {
        Subject::NamedNode(n) => n.to_string(),
        Subject::BlankNode(b) => format!("_:{}", labels[b.as_str()]),
    };
    let object = match &triple.object {
        Term::NamedNode(n) => n.to_string(),
        Term::Literal(l) => l.to_string(),
        Term::BlankNode(b) => format!("_:{}", labels[b.as_str()]),
    };
    format!("{} {} {} .", subject, triple.predicate, object)
}
