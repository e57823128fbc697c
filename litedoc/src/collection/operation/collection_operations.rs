use parking_lot::RwLock;

use crate::collection::{
    Document, ExplainResult, FindOptions, ObjectId, UpdateOptions, UpdateSpec,
};
use crate::common::stream::DocumentCursor;
use crate::common::SortableFields;
use crate::errors::LiteDocResult;
use crate::filter::Filter;
use crate::index::{IndexDescriptor, IndexOptions};
use crate::store::DocumentMap;

use super::{
    FindOptimizer, IndexManager, ReadOperations, RemoveResult, UpdateResult, WriteOperations,
    WriteResult,
};

/// Wires the operations of one collection together and guards them with
/// the collection gate: writes hold it shared, index builds and removals
/// hold it exclusively. Reads do not touch it.
pub(crate) struct CollectionOperations {
    document_map: DocumentMap,
    gate: RwLock<()>,
    index_manager: IndexManager,
    read_operations: ReadOperations,
    write_operations: WriteOperations,
}

impl CollectionOperations {
    pub fn new(collection_name: &str) -> Self {
        let document_map = DocumentMap::new(collection_name);
        let index_manager = IndexManager::new(collection_name, document_map.clone());
        let read_operations = ReadOperations::new(
            collection_name,
            document_map.clone(),
            index_manager.clone(),
            FindOptimizer::new(),
        );
        let write_operations = WriteOperations::new(
            collection_name,
            document_map.clone(),
            index_manager.clone(),
            read_operations.clone(),
        );

        CollectionOperations {
            document_map,
            gate: RwLock::new(()),
            index_manager,
            read_operations,
            write_operations,
        }
    }

    pub fn create_index(
        &self,
        fields: &SortableFields,
        options: &IndexOptions,
    ) -> LiteDocResult<IndexDescriptor> {
        let _gate = self.gate.write();
        self.document_map.check_opened()?;
        self.index_manager.create_index(fields, options)
    }

    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.index_manager.list_indexes()
    }

    pub fn has_index(&self, fields: &SortableFields) -> bool {
        self.index_manager.has_index(fields)
    }

    pub fn drop_index(&self, fields: &SortableFields) -> LiteDocResult<()> {
        let _gate = self.gate.write();
        self.document_map.check_opened()?;
        self.index_manager.drop_index(fields)
    }

    pub fn drop_all_indexes(&self) {
        let _gate = self.gate.write();
        self.index_manager.drop_all_indexes()
    }

    pub fn insert(&self, document: Document) -> LiteDocResult<WriteResult> {
        let _gate = self.gate.read();
        self.write_operations.insert(document)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> LiteDocResult<WriteResult> {
        let _gate = self.gate.read();
        self.write_operations.insert_many(documents)
    }

    pub fn update(
        &self,
        filter: &Filter,
        spec: &UpdateSpec,
        options: &UpdateOptions,
    ) -> LiteDocResult<UpdateResult> {
        let _gate = self.gate.read();
        self.document_map.check_opened()?;
        self.write_operations.update(filter, spec, options)
    }

    pub fn remove(&self, filter: &Filter, just_once: bool) -> LiteDocResult<RemoveResult> {
        let _gate = self.gate.read();
        self.document_map.check_opened()?;
        self.write_operations.remove(filter, just_once)
    }

    pub fn find(&self, filter: Filter, find_options: &FindOptions) -> LiteDocResult<DocumentCursor> {
        self.document_map.check_opened()?;
        self.read_operations.find(filter, find_options)
    }

    pub fn get_by_id(&self, id: &ObjectId) -> LiteDocResult<Document> {
        self.read_operations.get_by_id(id)
    }

    pub fn explain(&self, filter: &Filter) -> LiteDocResult<ExplainResult> {
        self.document_map.check_opened()?;
        self.read_operations.explain(filter)
    }

    pub fn count(&self, filter: &Filter) -> LiteDocResult<usize> {
        self.document_map.check_opened()?;
        self.read_operations.count(filter)
    }

    pub fn size(&self) -> LiteDocResult<usize> {
        self.document_map.size()
    }

    pub fn is_dropped(&self) -> bool {
        self.document_map.is_dropped()
    }

    /// Drops every document and index; the collection is unusable after.
    pub fn dispose(&self) {
        let _gate = self.gate.write();
        self.index_manager.clear();
        self.index_manager.drop_all_indexes();
        self.document_map.dispose();
    }
}
