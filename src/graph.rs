use std::collections::{HashMap, HashSet, VecDeque};

/// Node id -> neighbor ids.
pub type Adjacency = HashMap<usize, Vec<usize>>;

/// All nodes reachable from `start_nodes` within `max_depth` hops, start nodes included.
///
/// Nodes without an adjacency entry are leaves.
pub fn bfs_neighbors(adjacency: &Adjacency, start_nodes: &[usize], max_depth: usize) -> HashSet<usize> {
    let mut visited = HashSet::new();
    let mut frontier = VecDeque::new();

    for &node in start_nodes {
        if visited.insert(node) {
            frontier.push_back((node, 0));
        }
    }

    while let Some((current, depth)) = frontier.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(neighbors) = adjacency.get(&current) else {
            continue;
        };
        for &neighbor in neighbors {
            if visited.insert(neighbor) {
                frontier.push_back((neighbor, depth + 1));
            }
        }
    }

    visited
}

/// Component label per node in `0..node_count`.
///
/// Labels are handed out in ascending order of each component's lowest node.
/// Edges to nodes outside the range are ignored.
pub fn find_connected_components(adjacency: &Adjacency, node_count: usize) -> Vec<usize> {
    let mut labels: Vec<Option<usize>> = vec![None; node_count];
    let mut next_label = 0;
    let mut queue = VecDeque::new();

    for node in 0..node_count {
        if labels[node].is_some() {
            continue;
        }

        labels[node] = Some(next_label);
        queue.push_back(node);

        while let Some(current) = queue.pop_front() {
            let Some(neighbors) = adjacency.get(&current) else {
                continue;
            };
            for &neighbor in neighbors {
                if neighbor < node_count && labels[neighbor].is_none() {
                    labels[neighbor] = Some(next_label);
                    queue.push_back(neighbor);
                }
            }
        }

        next_label += 1;
    }

    tracing::debug!(nodes = node_count, components = next_label, "labelled components");
    labels.into_iter().map(|label| label.unwrap_or_default()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Adjacency {
        HashMap::from([
            (0, vec![1]),
            (1, vec![0, 2]),
            (2, vec![1, 3]),
            (3, vec![2]),
        ])
    }

    #[test]
    fn bfs_respects_depth_limit() {
        let reached = bfs_neighbors(&chain(), &[0], 2);
        assert_eq!(reached, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn bfs_depth_zero_returns_start_nodes() {
        let reached = bfs_neighbors(&chain(), &[3, 1, 3], 0);
        assert_eq!(reached, HashSet::from([1, 3]));
    }

    #[test]
    fn bfs_treats_unknown_nodes_as_leaves() {
        let reached = bfs_neighbors(&chain(), &[42], 5);
        assert_eq!(reached, HashSet::from([42]));
    }

    #[test]
    fn components_labelled_in_node_order() {
        let adjacency = HashMap::from([
            (0, vec![3]),
            (3, vec![0]),
            (1, vec![2, 99]),
            (2, vec![1]),
        ]);
        let labels = find_connected_components(&adjacency, 5);
        assert_eq!(labels, vec![0, 1, 1, 0, 2]);
    }

    #[test]
    fn components_of_empty_graph() {
        assert!(find_connected_components(&Adjacency::new(), 0).is_empty());
        assert_eq!(
            find_connected_components(&Adjacency::new(), 3),
            vec![0, 1, 2]
        );
    }
}
