/// A disjoint-set forest over pixel indices.
///
/// Union by size keeps the trees shallow and [`UnionFind::find`] compresses the
/// path it walks, so a full labeling pass is close to linear in the pixel count.
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    /// Creates `len` singleton sets.
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Returns the root of the set containing `id`, compressing the walked path.
    pub fn find(&mut self, mut id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // collapse the path onto the root
        while self.parent[id] != root {
            let next = self.parent[id];
            self.parent[id] = root;
            id = next;
        }

        root
    }

    /// Merges the sets containing `a` and `b` and returns the root of the union.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let a_root = self.find(a);
        let b_root = self.find(b);
        if a_root == b_root {
            return a_root;
        }

        let (big, small) = if self.size[a_root] >= self.size[b_root] {
            (a_root, b_root)
        } else {
            (b_root, a_root)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl UnionFind {
        fn set_size(&mut self, id: usize) -> usize {
            let root = self.find(id);
            self.size[root]
        }
    }

    #[test]
    fn test_find_singletons() {
        let mut uf = UnionFind::new(10);

        assert_eq!(uf.find(0), 0);
        assert_eq!(uf.find(5), 5);
        assert_eq!(uf.find(9), 9);
    }

    #[test]
    fn test_union() {
        let mut uf = UnionFind::new(10);

        uf.union(0, 1);
        assert_eq!(uf.find(0), uf.find(1));

        uf.union(1, 2);
        assert_eq!(uf.find(0), uf.find(2));

        uf.union(3, 4);
        assert_eq!(uf.find(3), uf.find(4));
        assert_ne!(uf.find(0), uf.find(3));

        uf.union(0, 3);
        assert_eq!(uf.find(0), uf.find(4));
        assert_eq!(uf.set_size(4), 5);
        assert_eq!(uf.set_size(9), 1);
    }

    #[test]
    fn test_union_by_size_keeps_larger_root() {
        let mut uf = UnionFind::new(4);
        let root = uf.union(0, 1);
        assert_eq!(uf.union(2, root), root);
    }
}
